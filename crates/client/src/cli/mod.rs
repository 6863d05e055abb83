pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Init, Key, Keygen, Login, Logout, Recover, Register, Users, Version, Whoami};
