pub mod init;
pub mod key;
pub mod keygen;
pub mod login;
pub mod logout;
pub mod recover;
pub mod register;
pub mod users;
pub mod version;
pub mod whoami;

pub use init::Init;
pub use key::Key;
pub use keygen::Keygen;
pub use login::Login;
pub use logout::Logout;
pub use recover::Recover;
pub use register::Register;
pub use users::Users;
pub use version::Version;
pub use whoami::Whoami;
