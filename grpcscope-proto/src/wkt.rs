//! The `google.protobuf` well-known types channelz refers to.
//!
//! The generated code maps them here through `extern_path`, because the
//! `prost-types` versions do not implement serde.

use serde::{Deserialize, Serialize};

/// `google.protobuf.Timestamp`
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl Timestamp {
    /// True for the zero instant, which channelz uses for "never happened".
    pub fn is_unset(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }
}

/// `google.protobuf.Int64Value`
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct Int64Value {
    #[prost(int64, tag = "1")]
    pub value: i64,
}

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}
