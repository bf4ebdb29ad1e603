//! Portolan is a high-level API for embedding an interactive map into a host
//! application: markers, popups, measuring tools, a layer tree, search against remote
//! feature services, and shareable permalinks, all driven by a handful of calls.
//!
//! # Quick start
//!
//! ```no_run
//! use portolan::layer::Layer;
//! use portolan::{Api, ApiConfig, MapConfig};
//!
//! # tokio_test::block_on(async {
//! let mut api = Api::new(ApiConfig {
//!     base_url: "https://example.com".into(),
//!     query_url: Some("https://example.com/query".into()),
//!     ..Default::default()
//! })
//! .expect("HTTP client can be built");
//!
//! api.create_map(
//!     &MapConfig {
//!         easting: Some(600000.0),
//!         northing: Some(200000.0),
//!         zoom: Some(12),
//!         ..Default::default()
//!     },
//!     vec![Layer::wms("base", "Base map", vec!["plan".into()])],
//! );
//!
//! // recenter on a server-side object and highlight it
//! api.show_features("parcels", &["42".into()]).await;
//! # });
//! ```
//!
//! # Main components
//!
//! * [`Api`] is the facade a site integrator works with. It owns the
//! * [`Map`](map::Map), which holds the current [`MapView`](map::MapView), the layer
//!   stack and fires [`MapEvent`](map::MapEvent)s when its state changes, and lazily
//!   constructs the
//! * [`Search`](search::Search) coordinator (recenter-by-id with a session feature
//!   cache, query-on-click), the
//! * [`Permalink`](permalink::Permalink) synchronizer (map state to URL and back), and
//!   the
//! * [`ToolbarBuilder`](toolbar::ToolbarBuilder) (declarative tool names to action
//!   objects).
//!
//! Rendering, projection math and tile loading are not part of this crate: the host
//! engine reads the map state and draws it, and calls back into the coordinators
//! through their operations.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
mod feature;
pub mod layer;
pub mod map;
mod marker;
pub mod measure;
pub mod permalink;
pub mod popup;
pub mod protocol;
pub mod search;
pub mod toolbar;

pub use api::{Api, ApiId, ApiPool, MapPanel, MapPanelConfig, Services, DRAW_LAYER_ID};
pub use config::{ApiConfig, MapConfig};
pub use error::PortolanError;
pub use feature::{Feature, FeatureId, FeatureProperties, FeatureRef};
pub use marker::MarkerOptions;
pub use popup::{Popup, PopupManager, PopupOptions};

// Reexport portolan_types
pub use portolan_types;
