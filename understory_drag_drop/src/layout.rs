// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-snapped layout geometry and the pure helpers built on it.
//!
//! A [`Layout`] is the untransformed, document-space box of an element. All four
//! fields are floored when the layout is constructed so that comparisons are not
//! disturbed by sub-pixel jitter between measurements.
//!
//! ```
//! use kurbo::Vec2;
//! use understory_drag_drop::layout::{Layout, intersection_ratio_of_layouts, transform_layout};
//!
//! let a = Layout::new(0.0, 0.0, 10.0, 10.0);
//! assert_eq!(intersection_ratio_of_layouts(&a, &a), 1.0);
//!
//! let moved = transform_layout(&a, Vec2::new(20.0, 0.0));
//! assert_eq!(intersection_ratio_of_layouts(&a, &moved), 0.0);
//! ```

use alloc::string::String;
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Vec2};

use crate::Element;

/// Accumulated pixel offset applied to an item. Identity is [`Vec2::ZERO`].
pub type Transform = Vec2;

/// An integer-snapped, axis-aligned box `{x, y, width, height}`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Layout {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// The four corners of a [`Layout`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Corners {
    /// `(left, top)`
    pub top_left: Point,
    /// `(right, top)`
    pub top_right: Point,
    /// `(right, bottom)`
    pub bottom_right: Point,
    /// `(left, bottom)`
    pub bottom_left: Point,
}

impl Layout {
    /// Create a layout, flooring every field.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: x.floor(),
            y: y.floor(),
            width: width.floor(),
            height: height.floor(),
        }
    }

    /// Create a layout from a measured rectangle, flooring origin and size.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Horizontal origin.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical origin.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The layout as a `kurbo` rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    /// Same as [`Layout::x`].
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Same as [`Layout::y`].
    pub fn top(&self) -> f64 {
        self.y
    }

    /// `x + width`.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// `y + height`.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Geometric center. Not snapped.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// The four corners.
    pub fn corners(&self) -> Corners {
        Corners {
            top_left: Point::new(self.left(), self.top()),
            top_right: Point::new(self.right(), self.top()),
            bottom_right: Point::new(self.right(), self.bottom()),
            bottom_left: Point::new(self.left(), self.bottom()),
        }
    }

    /// Area in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl From<Rect> for Layout {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

/// Why a CSS transform string could not be turned into a translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransformParseError {
    /// The transform function is neither `matrix(...)` nor `matrix3d(...)`.
    Unsupported(String),
    /// The matrix did not have the number of components its function requires.
    Arity {
        /// Components required.
        expected: usize,
        /// Components found.
        found: usize,
    },
    /// A translation component was not a number.
    InvalidNumber(String),
}

impl fmt::Display for TransformParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(value) => write!(f, "unsupported transform `{value}`"),
            Self::Arity { expected, found } => {
                write!(f, "expected {expected} matrix components, found {found}")
            }
            Self::InvalidNumber(value) => write!(f, "invalid matrix component `{value}`"),
        }
    }
}

impl core::error::Error for TransformParseError {}

/// Extract the translation of a computed CSS transform.
///
/// `none` and the empty string are the identity. Only `matrix(...)` (2D) and
/// `matrix3d(...)` (3D) are understood, which are the only forms a computed
/// style reports.
pub fn parse_translation(transform: &str) -> Result<Transform, TransformParseError> {
    let transform = transform.trim();
    if transform.is_empty() || transform == "none" {
        return Ok(Vec2::ZERO);
    }
    let (body, expected, tx, ty) = if let Some(rest) = transform.strip_prefix("matrix3d(") {
        (rest, 16, 12, 13)
    } else if let Some(rest) = transform.strip_prefix("matrix(") {
        (rest, 6, 4, 5)
    } else {
        return Err(TransformParseError::Unsupported(transform.into()));
    };
    let body = body
        .strip_suffix(')')
        .ok_or_else(|| TransformParseError::Unsupported(transform.into()))?;

    let mut translate = Vec2::ZERO;
    let mut found = 0;
    for (index, component) in body.split(',').map(str::trim).enumerate() {
        found += 1;
        if index != tx && index != ty {
            continue;
        }
        let value: f64 = component
            .parse()
            .map_err(|_| TransformParseError::InvalidNumber(component.into()))?;
        if !value.is_finite() {
            return Err(TransformParseError::InvalidNumber(component.into()));
        }
        if index == tx {
            translate.x = value;
        } else {
            translate.y = value;
        }
    }
    if found != expected {
        return Err(TransformParseError::Arity { expected, found });
    }
    Ok(translate)
}

/// Recover the untransformed layout of an element whose box includes a CSS transform.
///
/// Strings that cannot be parsed contribute no offset.
pub fn strip_transform_from_layout(layout: &Layout, transform: &str) -> Layout {
    let translate = parse_translation(transform).unwrap_or_else(|err| {
        tracing::debug!(%err, "ignoring unparseable transform");
        Vec2::ZERO
    });
    Layout::new(
        layout.x - translate.x,
        layout.y - translate.y,
        layout.width,
        layout.height,
    )
}

/// Measure an element and subtract its computed transform.
pub fn element_layout<N: Element>(node: &N) -> Layout {
    let layout = Layout::from_rect(node.bounding_rect());
    match node.computed_transform() {
        Some(transform) => strip_transform_from_layout(&layout, &transform),
        None => layout,
    }
}

/// Shift a layout by a transform.
pub fn transform_layout(layout: &Layout, transform: Transform) -> Layout {
    Layout::new(
        layout.x + transform.x,
        layout.y + transform.y,
        layout.width,
        layout.height,
    )
}

/// Euclidean distance between two points.
pub fn distance_between_points(first: Point, second: Point) -> f64 {
    first.distance(second)
}

/// Intersection area over `area(a) + area(b) - intersection`.
///
/// Returns `0.0` when the layouts do not overlap with positive area.
pub fn intersection_ratio_of_layouts(first: &Layout, second: &Layout) -> f64 {
    let top = first.top().max(second.top());
    let left = first.left().max(second.left());
    let right = first.right().min(second.right());
    let bottom = first.bottom().min(second.bottom());

    if left < right && top < bottom {
        let intersection = (right - left) * (bottom - top);
        intersection / (first.area() + second.area() - intersection)
    } else {
        0.0
    }
}

/// Field-wise equality of two layouts.
pub fn layouts_are_equal(first: &Layout, second: &Layout) -> bool {
    first.x == second.x
        && first.y == second.y
        && first.width == second.width
        && first.height == second.height
}

/// Field-wise equality of two transforms.
pub fn transforms_are_equal(first: Transform, second: Transform) -> bool {
    first.x == second.x && first.y == second.y
}
