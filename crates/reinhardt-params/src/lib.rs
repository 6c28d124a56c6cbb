//! # Reinhardt Params
//!
//! Request parameter collection and typed binding for Reinhardt.
//!
//! Every request gets a [`ParameterSet`] that holds parameters per source (query
//! string, route path, fixed route parameters, form body), uploaded files, the raw
//! JSON body, and a unified view merged from the four sources.
//!
//! ## Features
//!
//! - **Precedence**: fixed beats route beats form-and-query; query and form values
//!   for the same key accumulate in that order
//! - **Bounded bodies**: JSON bodies are read through a [`BoundedReader`] with a
//!   configurable limit (50 MiB by default)
//! - **Uploads**: multipart files stay in memory up to a budget and spill to
//!   temporary files beyond it
//! - **Binding**: [`Bindable`] types convert raw values, falling back to their zero
//!   value instead of failing
//! - **Cleanup**: [`params_filter`] deletes a request's temporary files exactly
//!   once on every exit path
//!
//! ## Example
//!
//! ```
//! use reinhardt_params::{HttpRequest, ParameterSet, ParamsSettings, parse_params};
//! use http::Method;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut request = HttpRequest::builder()
//!     .method(Method::POST)
//!     .uri("/customers/7?expand=orders")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .body("name=alice&tags=a&tags=b")
//!     .build()
//!     .unwrap();
//!
//! let mut params = ParameterSet::new();
//! params.set_route([("id", "7")]);
//! parse_params(&mut params, &mut request, &ParamsSettings::default()).await;
//!
//! let id: u64 = params.bind_value("id");
//! let tags: Vec<String> = params.bind_value("tags");
//! assert_eq!(id, 7);
//! assert_eq!(tags, ["a", "b"]);
//! assert_eq!(params.get("expand"), Some("orders"));
//! # }
//! ```
//!
//! ## Configuration
//!
//! Body limits and the upload directory live in [`ParamsSettings`], which can be
//! built in code, loaded from TOML, or read from `REINHARDT_PARAMS_*` environment
//! variables.

pub mod binder;
pub mod error;
pub mod filter;
pub mod limit;
pub mod params;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod settings;
pub mod upload;

pub use binder::{BindSource, Bindable, FromParamValue, Structured};
pub use error::{ParamsError, ParamsResult};
pub use filter::params_filter;
pub use limit::{BoundedReader, SizeLimitExceeded};
pub use params::{ParameterSet, ValueMap};
pub use parser::{parse_params, populate_json};
pub use request::{HttpRequest, HttpRequestBuilder, ParamsRequest};
pub use resolver::calc_values;
pub use settings::ParamsSettings;
pub use upload::{MultipartForm, UploadContent, UploadedFile};
