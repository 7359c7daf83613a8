pub mod tabla_locks;
pub mod tabla_undo;
