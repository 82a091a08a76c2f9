use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{Master, NewMaster};
use crate::repositories::PgPoolConn;
use crate::schema::masters::dsl::*;

pub fn create(conn: &mut PgPoolConn, new_master: &NewMaster) -> Result<Master, diesel::result::Error> {
    diesel::insert_into(masters)
        .values(new_master)
        .get_result(conn)
}

pub fn find_by_id(conn: &mut PgPoolConn, master_id: i32) -> Result<Master, diesel::result::Error> {
    masters.find(master_id).first(conn)
}

pub fn list_not_deleted(conn: &mut PgPoolConn) -> Result<Vec<Master>, diesel::result::Error> {
    masters.filter(deleted.eq(false)).order(id.asc()).load(conn)
}

/// `species` and `stock_id` are never rewritten.
pub fn update(conn: &mut PgPoolConn, master: &Master, now: NaiveDateTime) -> Result<Master, diesel::result::Error> {
    diesel::update(masters.find(master.id))
        .set((
            name.eq(&master.name),
            active.eq(master.active),
            deleted.eq(master.deleted),
            updated_at.eq(now),
        ))
        .get_result(conn)
}
