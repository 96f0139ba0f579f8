mod autosign;
mod certificate;
mod hostname;
mod record;

pub use autosign::*;
pub use certificate::*;
pub use hostname::*;
pub use record::*;
