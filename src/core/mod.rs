// Core modules implementing sizing, packing, addressing, and error modeling.
pub mod encoding;
pub mod error;
pub mod handler;
pub mod layout;
pub mod options;
pub mod pack;
pub mod scan;
pub(crate) mod source;
pub mod table;
pub(crate) mod token;
