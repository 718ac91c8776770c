// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The shared record id sequence.

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::diesel_schema::id_sequence;
use crate::error::PersistenceError;

const RECORD_SEQUENCE: &str = "records";

/// Issues a fresh record id.
///
/// Windows, signups, events and plans draw from the same sequence, so an id
/// never repeats across record kinds. Inside a transaction that rolls back
/// the id is returned to the sequence.
///
/// # Errors
///
/// Returns an error if the sequence row cannot be advanced.
pub fn next_id(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::update(id_sequence::table.find(RECORD_SEQUENCE))
        .set(id_sequence::last_id.eq(id_sequence::last_id + 1))
        .returning(id_sequence::last_id)
        .get_result::<i64>(conn)?)
}
