pub mod import;
pub mod inspect;
pub mod pack;
pub mod remote;
