//! Annotation data model: categories, markers, and per-category counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a category's geometry is captured and drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// A single click produces the marker.
    Point,
    /// A freehand drag produces an open polyline.
    Path,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Screw,
    Bolt,
    Component,
    Custom,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Screw,
        Category::Bolt,
        Category::Component,
        Category::Custom,
    ];

    pub fn shape(self) -> ShapeKind {
        match self {
            Category::Screw | Category::Bolt => ShapeKind::Point,
            Category::Component | Category::Custom => ShapeKind::Path,
        }
    }

    /// Wire name used in project files.
    pub fn name(self) -> &'static str {
        match self {
            Category::Screw => "screw",
            Category::Bolt => "bolt",
            Category::Component => "component",
            Category::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Capitalized label for the step list and buttons.
    pub fn label(self) -> &'static str {
        match self {
            Category::Screw => "Screw",
            Category::Bolt => "Bolt",
            Category::Component => "Component",
            Category::Custom => "Custom",
        }
    }

    pub fn color(self) -> Rgb {
        color_for_name(self.name())
    }

    fn index(self) -> usize {
        match self {
            Category::Screw => 0,
            Category::Bolt => 1,
            Category::Component => 2,
            Category::Custom => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Category color by wire name. Names outside the known set map to black.
pub fn color_for_name(name: &str) -> Rgb {
    match name {
        "screw" => Rgb::new(0x28, 0xa7, 0x45),
        "bolt" => Rgb::new(0xdc, 0x35, 0x45),
        "component" => Rgb::new(0x00, 0x7b, 0xff),
        "custom" => Rgb::new(0xff, 0xc1, 0x07),
        _ => Rgb::BLACK,
    }
}

/// A position in image (canvas) space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerGeometry {
    Point(ImagePoint),
    /// Open polyline, never empty.
    Path(Vec<ImagePoint>),
}

impl MarkerGeometry {
    pub fn points(&self) -> &[ImagePoint] {
        match self {
            MarkerGeometry::Point(p) => std::slice::from_ref(p),
            MarkerGeometry::Path(points) => points,
        }
    }

    pub fn first(&self) -> Option<ImagePoint> {
        self.points().first().copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub category: Category,
    pub number: u32,
    pub geometry: MarkerGeometry,
    pub instructions: String,
}

impl Marker {
    /// One line of the step list, e.g. `#2 (Bolt) - remove with 10mm socket`.
    pub fn step_label(&self) -> String {
        let instructions = self.instructions.trim();
        if instructions.is_empty() {
            format!("#{} ({})", self.number, self.category.label())
        } else {
            format!(
                "#{} ({}) - {}",
                self.number,
                self.category.label(),
                instructions
            )
        }
    }
}

/// Highest sequence number a category can reach.
pub const MAX_SEQUENCE_NUMBER: u32 = 1_000_000;

/// Next sequence number to hand out, per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounters {
    #[serde(default = "first_number")]
    screw: u32,
    #[serde(default = "first_number")]
    bolt: u32,
    #[serde(default = "first_number")]
    component: u32,
    #[serde(default = "first_number")]
    custom: u32,
}

fn first_number() -> u32 {
    1
}

impl Default for CategoryCounters {
    fn default() -> Self {
        Self {
            screw: 1,
            bolt: 1,
            component: 1,
            custom: 1,
        }
    }
}

impl CategoryCounters {
    pub fn get(&self, category: Category) -> u32 {
        self.slots()[category.index()]
    }

    pub fn set(&mut self, category: Category, next: u32) {
        *self.slot_mut(category) = next.max(1);
    }

    /// Hand out the current number and advance the counter. `None` once
    /// the category is past `MAX_SEQUENCE_NUMBER`.
    pub(crate) fn take(&mut self, category: Category) -> Option<u32> {
        let slot = self.slot_mut(category);
        let number = (*slot).max(1);
        if number > MAX_SEQUENCE_NUMBER {
            return None;
        }
        *slot = number + 1;
        Some(number)
    }

    fn slots(&self) -> [u32; 4] {
        [self.screw, self.bolt, self.component, self.custom]
    }

    fn slot_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Screw => &mut self.screw,
            Category::Bolt => &mut self.bolt,
            Category::Component => &mut self.component,
            Category::Custom => &mut self.custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kinds() {
        assert_eq!(Category::Screw.shape(), ShapeKind::Point);
        assert_eq!(Category::Bolt.shape(), ShapeKind::Point);
        assert_eq!(Category::Component.shape(), ShapeKind::Path);
        assert_eq!(Category::Custom.shape(), ShapeKind::Path);
    }

    #[test]
    fn test_name_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
        assert_eq!(Category::from_name("washer"), None);
    }

    #[test]
    fn test_colors_are_total() {
        assert_eq!(Category::Screw.color(), Rgb::new(0x28, 0xa7, 0x45));
        assert_eq!(Category::Custom.color(), Rgb::new(0xff, 0xc1, 0x07));
        assert_eq!(color_for_name("washer"), Rgb::BLACK);
        assert_eq!(color_for_name(""), Rgb::BLACK);
    }

    #[test]
    fn test_counters_take_and_floor() {
        let mut counters = CategoryCounters::default();
        assert_eq!(counters.take(Category::Bolt), Some(1));
        assert_eq!(counters.take(Category::Bolt), Some(2));
        assert_eq!(counters.get(Category::Bolt), 3);
        assert_eq!(counters.get(Category::Screw), 1);

        counters.set(Category::Bolt, 0);
        assert_eq!(counters.get(Category::Bolt), 1);
    }

    #[test]
    fn test_counters_stop_at_the_limit() {
        let mut counters = CategoryCounters::default();
        counters.set(Category::Screw, MAX_SEQUENCE_NUMBER);
        assert_eq!(counters.take(Category::Screw), Some(MAX_SEQUENCE_NUMBER));
        assert_eq!(counters.take(Category::Screw), None);
        assert_eq!(counters.get(Category::Screw), MAX_SEQUENCE_NUMBER + 1);

        counters.set(Category::Bolt, u32::MAX);
        assert_eq!(counters.take(Category::Bolt), None);
    }

    #[test]
    fn test_zero_counter_from_file_still_hands_out_one() {
        let mut counters: CategoryCounters = serde_json::from_str(r#"{"screw": 0}"#).unwrap();
        assert_eq!(counters.take(Category::Screw), Some(1));
    }

    #[test]
    fn test_counters_missing_keys_default_to_one() {
        let counters: CategoryCounters = serde_json::from_str(r#"{"bolt": 4}"#).unwrap();
        assert_eq!(counters.get(Category::Bolt), 4);
        assert_eq!(counters.get(Category::Screw), 1);
        assert_eq!(counters.get(Category::Custom), 1);
    }

    #[test]
    fn test_step_label() {
        let mut marker = Marker {
            category: Category::Component,
            number: 3,
            geometry: MarkerGeometry::Path(vec![ImagePoint::new(0.0, 0.0)]),
            instructions: String::new(),
        };
        assert_eq!(marker.step_label(), "#3 (Component)");

        marker.instructions = "  lift the battery  ".to_string();
        assert_eq!(marker.step_label(), "#3 (Component) - lift the battery");
    }
}
