//! pagemeta Core Library
//!
//! Content model, resolved fields, configuration and error handling shared by
//! the pagemeta generator and CLI.

pub mod config;
pub mod content;
pub mod env;
pub mod error;
pub mod field;
pub mod frontmatter;
pub mod resolvable;

pub use config::Config;
pub use content::{Content, Image, Language, Page, PageOptions, Site, Thumb};
pub use env::{Env, EnvValue};
pub use error::{CoreError, Result};
pub use field::{Field, MetaProducer, MetaValue, MetadataMap, Produced};
pub use resolvable::Resolvable;
