mod connection_directory;
mod error;
mod peer_record;

pub use connection_directory::ConnectionDirectory;
pub use error::DirectoryError;
pub use peer_record::PeerRecord;
