mod peer_links;

pub use peer_links::{PeerLink, PeerLinks};
