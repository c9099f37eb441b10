//! Public library API for reflection-driven JSON and XML value codecs.

/// Type descriptors, slot storage, and the JSON/XML/config/table codecs.
pub mod codec;
