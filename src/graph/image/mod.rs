//! Pixel-grid graphs for image tracing.
//!
//! Every pixel of a [`GrayImage`] is a vertex with id `y * width + x`; each vertex has an
//! edge to each of its (up to) eight neighbours. Edges are computed on the fly, so an
//! [`ImageGraph`] costs one byte per pixel.

mod pgm;
pub mod weights;

use serde::{Deserialize, Serialize};

use super::{Edge, Graph, VertexId};
use crate::error::{Error, Result};
use crate::paths::Path;

pub use weights::{make_weigher, ImageWeigher, WeigherKind};

/// An 8-bit grayscale raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GrayImage {
    /// Wraps row-major `pixels`.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::ParseImage(format!("empty image {width}x{height}")));
        }
        if pixels.len() != width * height {
            return Err(Error::ParseImage(format!(
                "expected {} pixels for {width}x{height}, got {}",
                width * height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        assert!(width > 0 && height > 0, "image dimensions must be non-zero");
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decodes a binary (`P5`) or ASCII (`P2`) PGM file.
    pub fn from_pgm(bytes: &[u8]) -> Result<Self> {
        pgm::decode(bytes)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the image.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside image");
        self.pixels[y * self.width + x]
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A polyline through pixel centres, as drawn by the tracing tool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolyLine {
    points: Vec<Point>,
}

impl PolyLine {
    /// Wraps `points`.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// First point, if any.
    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Last point, if any.
    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points in order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// One of the eight neighbour directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +x
    East,
    /// +x, -y
    NorthEast,
    /// -y
    North,
    /// -x, -y
    NorthWest,
    /// -x
    West,
    /// -x, +y
    SouthWest,
    /// +y
    South,
    /// +x, +y
    SouthEast,
}

impl Direction {
    /// All directions, counter-clockwise from east.
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    /// Column and row offsets of this direction.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::North => (0, -1),
            Direction::NorthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::South => (0, 1),
            Direction::SouthEast => (1, 1),
        }
    }

    /// Returns `true` for the four diagonal directions.
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }
}

/// An edge between two neighbouring pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageEdge {
    start: VertexId,
    end: VertexId,
    direction: Direction,
}

impl ImageEdge {
    /// Direction from the start pixel to the end pixel.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl Edge for ImageEdge {
    #[inline]
    fn start_id(&self) -> VertexId {
        self.start
    }

    #[inline]
    fn end_id(&self) -> VertexId {
        self.end
    }
}

/// Graph over the pixels of an image, with 8-neighbour adjacency.
#[derive(Debug, Clone)]
pub struct ImageGraph {
    image: GrayImage,
}

impl ImageGraph {
    /// Builds the pixel graph of `image`.
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    /// The underlying image.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.image.width
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.image.height
    }

    /// Vertex id of the pixel at `p`, or `None` if `p` lies outside the image.
    pub fn id_at(&self, p: Point) -> Option<VertexId> {
        (p.x < self.width() && p.y < self.height()).then(|| p.y * self.width() + p.x)
    }

    /// Pixel of vertex `id`.
    ///
    /// # Panics
    /// Panics if `id` is not a vertex of this graph.
    pub fn point_at(&self, id: VertexId) -> Point {
        assert!(id < self.vertex_count(), "vertex {id} outside image");
        Point::new(id % self.width(), id / self.width())
    }

    /// Converts a path of vertex ids into the polyline through their pixels.
    pub fn path_to_polyline(&self, path: &Path) -> PolyLine {
        PolyLine::new(path.iter().map(|id| self.point_at(id)).collect())
    }

    fn neighbor(&self, id: VertexId, direction: Direction) -> Option<VertexId> {
        let (dx, dy) = direction.offset();
        let x = (id % self.width()).checked_add_signed(dx)?;
        let y = (id / self.width()).checked_add_signed(dy)?;
        (x < self.width() && y < self.height()).then(|| y * self.width() + x)
    }
}

impl Graph for ImageGraph {
    type Edge = ImageEdge;

    #[inline]
    fn vertex_count(&self) -> usize {
        self.image.pixels.len()
    }

    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = ImageEdge> + '_ {
        assert!(id < self.vertex_count(), "vertex {id} outside image");
        Direction::ALL.into_iter().filter_map(move |direction| {
            self.neighbor(id, direction).map(|end| ImageEdge {
                start: id,
                end,
                direction,
            })
        })
    }
}
