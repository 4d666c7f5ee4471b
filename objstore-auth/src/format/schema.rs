#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Caveat {
    #[prost(bool, tag="1")]
    pub disallow_reads: bool,
    #[prost(bool, tag="2")]
    pub disallow_writes: bool,
    #[prost(bool, tag="3")]
    pub disallow_lists: bool,
    #[prost(bool, tag="4")]
    pub disallow_deletes: bool,
    #[prost(message, repeated, tag="10")]
    pub allowed_paths: ::prost::alloc::vec::Vec<caveat::Path>,
    #[prost(message, optional, tag="20")]
    pub not_after: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag="21")]
    pub not_before: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(bytes="vec", tag="30")]
    pub nonce: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag="40")]
    pub max_object_ttl: ::core::option::Option<::prost_types::Duration>,
    #[prost(bool, tag="50")]
    pub disallow_locks: bool,
    #[prost(bool, tag="51")]
    pub disallow_put_retention: bool,
    #[prost(bool, tag="52")]
    pub disallow_get_retention: bool,
    #[prost(bool, tag="53")]
    pub disallow_put_legal_hold: bool,
    #[prost(bool, tag="54")]
    pub disallow_get_legal_hold: bool,
    #[prost(bool, tag="55")]
    pub disallow_bypass_governance_retention: bool,
    #[prost(bool, tag="56")]
    pub disallow_put_bucket_object_lock_configuration: bool,
    #[prost(bool, tag="57")]
    pub disallow_get_bucket_object_lock_configuration: bool,
}
/// Nested message and enum types in `Caveat`.
pub mod caveat {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Path {
        #[prost(bytes="vec", tag="1")]
        pub bucket: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes="vec", tag="2")]
        pub encrypted_path_prefix: ::prost::alloc::vec::Vec<u8>,
    }
}
