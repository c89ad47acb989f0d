//! Named edge-weight functions for image graphs.
//!
//! Every weigher multiplies a per-pixel cost by the step length of the edge
//! (5 for orthogonal steps, 7 for diagonal ones, a cheap integer stand-in for 1 : √2),
//! so a straight diagonal is not cheaper than the staircase beside it.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{GrayImage, ImageEdge, ImageGraph};
use crate::error::{Error, Result};
use crate::graph::{Edge, Weigher, Weight};

const ORTHOGONAL_STEP: Weight = 5;
const DIAGONAL_STEP: Weight = 7;

/// The weight functions the tracing tool offers, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeigherKind {
    /// Geometric length only; traces straight lines.
    Unit,
    /// Prefers dark pixels: cost grows with the destination's brightness.
    Intensity,
    /// Prefers strong edges: cost falls as the Sobel gradient magnitude rises.
    #[default]
    Gradient,
}

impl WeigherKind {
    /// Every registered kind.
    pub const ALL: [WeigherKind; 3] = [WeigherKind::Unit, WeigherKind::Intensity, WeigherKind::Gradient];

    /// Registered name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            WeigherKind::Unit => "unit",
            WeigherKind::Intensity => "intensity",
            WeigherKind::Gradient => "gradient",
        }
    }

    /// Instantiates this weight function for `graph`, precomputing per-pixel costs.
    pub fn build(self, graph: &ImageGraph) -> ImageWeigher {
        match self {
            WeigherKind::Unit => ImageWeigher::Unit,
            WeigherKind::Intensity => ImageWeigher::PixelCost(
                graph
                    .image()
                    .pixels()
                    .iter()
                    .map(|&lum| Weight::from(lum) + 1)
                    .collect(),
            ),
            WeigherKind::Gradient => ImageWeigher::PixelCost(gradient_costs(graph.image())),
        }
    }
}

impl fmt::Display for WeigherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeigherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WeigherKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownWeigher(s.to_owned()))
    }
}

/// Looks up the weight function called `name` and instantiates it for `graph`.
pub fn make_weigher(name: &str, graph: &ImageGraph) -> Result<ImageWeigher> {
    Ok(name.parse::<WeigherKind>()?.build(graph))
}

/// A weight function over [`ImageEdge`]s; cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub enum ImageWeigher {
    /// Step length only.
    Unit,
    /// Step length times the cost of the destination pixel.
    PixelCost(Arc<[Weight]>),
}

impl Weigher<ImageEdge> for ImageWeigher {
    #[inline]
    fn weight(&self, edge: &ImageEdge) -> Weight {
        let step = if edge.direction().is_diagonal() {
            DIAGONAL_STEP
        } else {
            ORTHOGONAL_STEP
        };
        match self {
            ImageWeigher::Unit => step,
            ImageWeigher::PixelCost(costs) => step * costs[edge.end_id()],
        }
    }
}

/// Per-pixel cost `256 - |∇I|`, with `|∇I|` the Sobel magnitude scaled into `0..=255`.
fn gradient_costs(image: &GrayImage) -> Arc<[Weight]> {
    let (w, h) = (image.width(), image.height());
    let at = |x: usize, y: usize, dx: isize, dy: isize| -> i32 {
        let cx = x.saturating_add_signed(dx).min(w - 1);
        let cy = y.saturating_add_signed(dy).min(h - 1);
        i32::from(image.get(cx, cy))
    };

    let mut costs = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let gx = (at(x, y, 1, -1) + 2 * at(x, y, 1, 0) + at(x, y, 1, 1))
                - (at(x, y, -1, -1) + 2 * at(x, y, -1, 0) + at(x, y, -1, 1));
            let gy = (at(x, y, -1, 1) + 2 * at(x, y, 0, 1) + at(x, y, 1, 1))
                - (at(x, y, -1, -1) + 2 * at(x, y, 0, -1) + at(x, y, 1, -1));
            // |gx| + |gy| <= 2040
            let magnitude = ((gx.abs() + gy.abs()) / 8).min(255);
            costs.push(Weight::try_from(256 - magnitude).unwrap_or(1));
        }
    }
    costs.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::image::Direction;
    use crate::graph::Graph;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!("unit".parse::<WeigherKind>().unwrap(), WeigherKind::Unit);
        assert_eq!(" Gradient ".parse::<WeigherKind>().unwrap(), WeigherKind::Gradient);
        assert_eq!(
            "laplace".parse::<WeigherKind>().unwrap_err(),
            Error::UnknownWeigher("laplace".into())
        );
        for kind in WeigherKind::ALL {
            assert_eq!(kind.to_string().parse::<WeigherKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unit_weights_step_length() {
        let g = ImageGraph::new(GrayImage::from_fn(3, 3, |_, _| 0));
        let w = make_weigher("unit", &g).unwrap();
        for edge in g.outgoing_edges(4) {
            let expected = if edge.direction().is_diagonal() { 7 } else { 5 };
            assert_eq!(w.weight(&edge), expected);
        }
    }

    #[test]
    fn test_intensity_prefers_dark_pixels() {
        // Left column dark, everything else bright.
        let g = ImageGraph::new(GrayImage::from_fn(3, 3, |x, _| if x == 0 { 0 } else { 255 }));
        let w = WeigherKind::Intensity.build(&g);
        let mut west = None;
        let mut east = None;
        for edge in g.outgoing_edges(4) {
            match edge.direction() {
                Direction::West => west = Some(w.weight(&edge)),
                Direction::East => east = Some(w.weight(&edge)),
                _ => {}
            }
        }
        assert_eq!(west, Some(5));
        assert_eq!(east, Some(5 * 256));
    }

    #[test]
    fn test_gradient_is_cheapest_on_edges() {
        // Vertical step edge between columns 1 and 2.
        let img = GrayImage::from_fn(4, 4, |x, _| if x < 2 { 0 } else { 255 });
        let costs = gradient_costs(&img);
        let flat = GrayImage::from_fn(4, 4, |_, _| 90);
        let flat_costs = gradient_costs(&flat);
        assert!(flat_costs.iter().all(|&c| c == 256));
        assert!(costs[1] < costs[0]);
        assert!(costs.iter().all(|&c| (1..=256).contains(&c)));
    }
}
