//! Wire messages for the `httpgrpc.HTTP` service.
//!
//! Field numbers match `httpgrpc.proto`, so any backend speaking that service
//! can be reached without generated code.

/// An HTTP request carried over gRPC.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRequest {
    #[prost(string, tag = "1")]
    pub method: ::prost::alloc::string::String,
    /// Path component of the original URL.
    #[prost(string, tag = "2")]
    pub url: ::prost::alloc::string::String,
    /// One entry per header key; values keep their original order.
    #[prost(message, repeated, tag = "3")]
    pub headers: ::prost::alloc::vec::Vec<Header>,
    #[prost(bytes = "bytes", tag = "4")]
    pub body: ::prost::bytes::Bytes,
}

/// An HTTP response carried over gRPC, either as the call result or embedded
/// in a failed call's status details.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(message, repeated, tag = "2")]
    pub headers: ::prost::alloc::vec::Vec<Header>,
    #[prost(bytes = "bytes", tag = "3")]
    pub body: ::prost::bytes::Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub values: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// `google.rpc.Status`, as found in the `grpc-status-details-bin` trailer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    pub details: ::prost::alloc::vec::Vec<::prost_types::Any>,
}

/// Fully-qualified method path of the unary `Handle` call.
pub const HANDLE_PATH: &str = "/httpgrpc.HTTP/Handle";

/// Type URL under which backends pack an [`HttpResponse`] into status details.
pub const HTTP_RESPONSE_TYPE_URL: &str = "type.googleapis.com/httpgrpc.HTTPResponse";

impl Header {
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

impl HttpResponse {
    /// Pack this response into a `google.rpc.Status` detail payload.
    pub fn to_status_details(&self, message: &str) -> ::prost::bytes::Bytes {
        use prost::Message;

        let status = RpcStatus {
            code: self.code,
            message: message.to_string(),
            details: vec![::prost_types::Any {
                type_url: HTTP_RESPONSE_TYPE_URL.to_string(),
                value: self.encode_to_vec(),
            }],
        };
        status.encode_to_vec().into()
    }
}
