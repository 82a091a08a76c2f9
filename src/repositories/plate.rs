use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{NewPlateRow, PlateRow};
use crate::repositories::PgPoolConn;
use crate::schema::plates::dsl::*;

pub fn create(conn: &mut PgPoolConn, new_plate: &NewPlateRow) -> Result<PlateRow, diesel::result::Error> {
    diesel::insert_into(plates)
        .values(new_plate)
        .get_result(conn)
}

pub fn find_by_id(conn: &mut PgPoolConn, wanted: i32) -> Result<PlateRow, diesel::result::Error> {
    plates.find(wanted).first(conn)
}

pub fn find_by_ids(conn: &mut PgPoolConn, wanted: Vec<i32>) -> Result<Vec<PlateRow>, diesel::result::Error> {
    plates.filter(id.eq_any(wanted)).order(id.asc()).load(conn)
}

pub fn find_by_master(conn: &mut PgPoolConn, owner: i32) -> Result<Vec<PlateRow>, diesel::result::Error> {
    plates.filter(master_id.eq(owner)).order(id.asc()).load(conn)
}

pub fn find_by_masters(conn: &mut PgPoolConn, owners: Vec<i32>) -> Result<Vec<PlateRow>, diesel::result::Error> {
    plates
        .filter(master_id.eq_any(owners))
        .order(id.asc())
        .load(conn)
}

pub fn exists(conn: &mut PgPoolConn, wanted: i32, wanted_kind: &str) -> Result<bool, diesel::result::Error> {
    Ok(plates
        .filter(id.eq(wanted))
        .filter(kind.eq(wanted_kind))
        .select(id)
        .first::<i32>(conn)
        .optional()?
        .is_some())
}

/// Writes `new_wells` only while the stored plate still has `wanted_kind` and
/// `expected` as its version. `Ok(None)` means no row matched.
pub fn swap_wells(
    conn: &mut PgPoolConn,
    wanted: i32,
    wanted_kind: &str,
    expected: i32,
    new_wells: &serde_json::Value,
    now: NaiveDateTime,
) -> Result<Option<PlateRow>, diesel::result::Error> {
    diesel::update(
        plates
            .filter(id.eq(wanted))
            .filter(kind.eq(wanted_kind))
            .filter(version.eq(expected)),
    )
        .set((
            wells.eq(new_wells),
            version.eq(expected + 1),
            updated_at.eq(now),
        ))
        .get_result(conn)
        .optional()
}
