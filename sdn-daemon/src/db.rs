//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Non-volatile storage for the one piece of state that must survive a
//! restart: this controller's own identity. `:memory:` (the default)
//! never persists it, matching the original controller's behavior of
//! re-registering at the central registry on every boot when run
//! without a database file.

use std::path::Path;

use pickledb::{PickleDb, PickleDbDumpPolicy, SerializationMethod};

use sdn_utils::ids::ControllerId;

const CONTROLLER_ID_KEY: &str = "controller_id";

pub trait Database: Send + Sync {
    fn controller_id(&self) -> Option<ControllerId>;
    fn set_controller_id(&mut self, id: ControllerId);
}

#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    controller_id: Option<ControllerId>,
}

impl Database for InMemoryDatabase {
    fn controller_id(&self) -> Option<ControllerId> {
        self.controller_id
    }

    fn set_controller_id(&mut self, id: ControllerId) {
        self.controller_id = Some(id);
    }
}

pub struct PickleDatabase {
    inner: PickleDb,
}

impl PickleDatabase {
    fn open<P: AsRef<Path>>(path: P) -> Result<PickleDatabase, pickledb::error::Error> {
        let dump_policy = PickleDbDumpPolicy::AutoDump;
        let serialization_method = SerializationMethod::Bin;
        let inner = if path.as_ref().exists() {
            PickleDb::load(path, dump_policy, serialization_method)?
        } else {
            PickleDb::new(path, dump_policy, serialization_method)
        };
        Ok(PickleDatabase { inner })
    }
}

impl Database for PickleDatabase {
    fn controller_id(&self) -> Option<ControllerId> {
        self.inner.get(CONTROLLER_ID_KEY)
    }

    fn set_controller_id(&mut self, id: ControllerId) {
        let _ = self.inner.set(CONTROLLER_ID_KEY, &id);
    }
}

/// Opens the database named by `location`: the in-memory store for
/// `:memory:`, otherwise a `pickledb`-backed file at that path.
pub fn open(location: &str) -> Box<dyn Database> {
    if location == ":memory:" {
        return Box::new(InMemoryDatabase::default());
    }

    match PickleDatabase::open(location) {
        Ok(db) => Box::new(db),
        Err(error) => {
            eprintln!("failed to open database at {location}: {error}");
            eprintln!("falling back to an in-memory database...");
            Box::new(InMemoryDatabase::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_round_trips_controller_id() {
        let mut db = InMemoryDatabase::default();
        assert_eq!(db.controller_id(), None);
        let id = ControllerId::new();
        db.set_controller_id(id);
        assert_eq!(db.controller_id(), Some(id));
    }
}
