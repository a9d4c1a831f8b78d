#![forbid(unsafe_code)]

//! Headless Sankey layout, reversible-link routing, and SVG output for
//! food-web flow graphs produced by `trawl-core`.
//!
//! The layout is a passive visual encoding: it sizes and positions
//! nodes from the display values it is given and never enforces flow
//! conservation. Feedback links (higher trophic level feeding a lower
//! one) are first-class: they survive layout and are routed as
//! three-segment composites instead of being rejected as cycles.

pub mod error;
pub mod model;
pub mod route;
pub mod sankey;
pub mod svg;
pub mod view;

pub use error::{Error, Result};
pub use model::{
    Bounds, LinkOpacity, Margin, SankeyConfig, SankeyDiagramLayout, SankeyLinkLayout,
    SankeyNodeLayout,
};
pub use route::{LinkRoute, route_bounds, route_links};
pub use sankey::{layout, relayout};
pub use svg::render_svg;
pub use view::{InteractiveView, LinkEmphasis};
