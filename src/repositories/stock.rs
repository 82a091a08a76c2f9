use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{NewStock, Stock};
use crate::repositories::PgPoolConn;
use crate::schema::stocks::dsl::*;

pub fn create(conn: &mut PgPoolConn, new_stock: &NewStock) -> Result<Stock, diesel::result::Error> {
    diesel::insert_into(stocks)
        .values(new_stock)
        .get_result(conn)
}

pub fn find_by_id(conn: &mut PgPoolConn, stock_id: i32) -> Result<Stock, diesel::result::Error> {
    stocks.find(stock_id).first(conn)
}

pub fn find_by_plate(conn: &mut PgPoolConn, plate: i32) -> Result<Vec<Stock>, diesel::result::Error> {
    stocks.filter(plate_id.eq(plate)).order(id.asc()).load(conn)
}

pub fn find_by_name(conn: &mut PgPoolConn, wanted: &str) -> Result<Vec<Stock>, diesel::result::Error> {
    stocks.filter(name.eq(wanted)).order(id.asc()).load(conn)
}

pub fn list_not_deleted(conn: &mut PgPoolConn) -> Result<Vec<Stock>, diesel::result::Error> {
    stocks.filter(deleted.eq(false)).order(id.asc()).load(conn)
}

pub fn update(conn: &mut PgPoolConn, stock: &Stock, now: NaiveDateTime) -> Result<Stock, diesel::result::Error> {
    diesel::update(stocks.find(stock.id))
        .set((
            name.eq(&stock.name),
            barcode.eq(&stock.barcode),
            species.eq(&stock.species),
            species_description.eq(&stock.species_description),
            optimisation.eq(&stock.optimisation),
            plate_type.eq(&stock.plate_type),
            active.eq(stock.active),
            deleted.eq(stock.deleted),
            updated_at.eq(now),
        ))
        .get_result(conn)
}
