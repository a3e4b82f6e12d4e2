//! Intentionally empty — this crate exists solely to host the cross-crate
//! integration tests under `tests/`.
