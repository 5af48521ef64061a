//! CLI commands

mod check_needinfo;
mod configure;
mod show_cert;
mod sign;
mod sign_from_bug;
mod sign_from_url;

pub use check_needinfo::CheckNeedinfoCommand;
pub use configure::ConfigureCommand;
pub use show_cert::ShowCertCommand;
pub use sign::SignCommand;
pub use sign_from_bug::SignFromBugCommand;
pub use sign_from_url::SignFromUrlCommand;
