//! Output enumeration
//!
//! The host platform supplies the list of physical outputs; this module only
//! defines their shape, the primary-display fallback, and the
//! subscribe/unsubscribe contract for screen-change notifications.

use std::collections::HashSet;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Identifier of a physical output, stable across enumerations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct OutputId(pub u32);

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Output {}", self.0)
    }
}

impl OutputId {
    /// Id used for the synthetic output when the platform reports none
    pub const FALLBACK: OutputId = OutputId(0);

    /// Derive a stable id from what the platform reports about an output.
    ///
    /// Only the output's name and connector index are hashed, so the id
    /// survives moves and mode changes. The connector index distinguishes
    /// identical monitors. FNV-1a gives the same value on every build, which
    /// persisted assignments rely on.
    pub fn from_descriptor(name: &str, connector: u32) -> Self {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let hash = name
            .bytes()
            .chain(connector.to_le_bytes())
            .fold(FNV_OFFSET, |h, byte| (h ^ u64::from(byte)).wrapping_mul(FNV_PRIME));
        // Fold to 32 bits, never colliding with the fallback id
        OutputId((((hash >> 32) ^ hash) as u32).max(1))
    }
}

/// Position and size of an output in the virtual desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputBounds {
    #[serde(rename = "x")]
    pub x: i32,
    #[serde(rename = "y")]
    pub y: i32,
    #[serde(rename = "width")]
    pub width: u32,
    #[serde(rename = "height")]
    pub height: u32,
}

impl Default for OutputBounds {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

impl OutputBounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Parse a `WxH+X+Y` geometry string (offset optional)
    pub fn parse_geometry(s: &str) -> Option<Self> {
        let (size, offset) = match s.find(['+', '-']) {
            Some(idx) => s.split_at(idx),
            None => (s, ""),
        };
        let (w, h) = size.split_once(['x', 'X'])?;
        let width: u32 = w.trim().parse().ok()?;
        let height: u32 = h.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }

        let (x, y) = if offset.is_empty() {
            (0, 0)
        } else {
            // Split "+X+Y" / "-X+Y" at the second sign
            let second = offset[1..].find(['+', '-'])? + 1;
            let (xs, ys) = offset.split_at(second);
            (xs.parse().ok()?, ys.parse().ok()?)
        };

        Some(Self::new(x, y, width, height))
    }

    /// Bounds as a desktop-space rectangle
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.x as f64 + self.width as f64,
            self.y as f64 + self.height as f64,
        )
    }

    pub fn same_origin(&self, other: &OutputBounds) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn same_size(&self, other: &OutputBounds) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// A physical display as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    pub id: OutputId,
    pub bounds: OutputBounds,
}

impl Output {
    pub fn new(id: OutputId, bounds: OutputBounds) -> Self {
        Self { id, bounds }
    }

    /// Synthetic output standing in for the primary display
    pub fn fallback(bounds: OutputBounds) -> Self {
        Self::new(OutputId::FALLBACK, bounds)
    }

    /// Label suitable for UI (includes resolution)
    pub fn label(&self) -> String {
        format!(
            "{} ({}x{} at {},{})",
            self.id, self.bounds.width, self.bounds.height, self.bounds.x, self.bounds.y
        )
    }
}

/// Connection change between two enumerations
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Connected(Output),
    Disconnected(OutputId),
}

/// Connection changes from `previous` to `current`
pub fn diff_outputs(previous: &[Output], current: &[Output]) -> Vec<DisplayEvent> {
    let previous_ids: HashSet<OutputId> = previous.iter().map(|o| o.id).collect();
    let current_ids: HashSet<OutputId> = current.iter().map(|o| o.id).collect();

    let connected = current
        .iter()
        .filter(|o| !previous_ids.contains(&o.id))
        .map(|o| DisplayEvent::Connected(o.clone()));
    let disconnected = previous
        .iter()
        .filter(|o| !current_ids.contains(&o.id))
        .map(|o| DisplayEvent::Disconnected(o.id));

    connected.chain(disconnected).collect()
}

/// Handle returned by [`DisplaySource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Screen-change listener; may be invoked from a platform thread
pub type DisplayListener = Box<dyn FnMut() + Send>;

/// Platform output enumeration and change notifications
pub trait DisplaySource {
    /// Current outputs in platform order
    fn outputs(&self) -> Vec<Output>;

    /// Register a listener called whenever the output set changes
    fn subscribe(&mut self, listener: DisplayListener) -> SubscriptionId;

    /// Remove a listener; returns `false` if it was not registered
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// In-memory display source for headless runs and tests
#[derive(Default)]
pub struct VirtualDisplaySource {
    outputs: Vec<Output>,
    listeners: Vec<(SubscriptionId, DisplayListener)>,
    next_subscription: u64,
}

impl VirtualDisplaySource {
    pub fn new(outputs: Vec<Output>) -> Self {
        Self {
            outputs,
            ..Default::default()
        }
    }

    /// Build outputs from `WxH+X+Y` geometry strings; invalid entries are skipped
    pub fn from_geometries<'a>(geometries: impl IntoIterator<Item = &'a str>) -> Self {
        let outputs = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(index, geometry)| {
                let bounds = OutputBounds::parse_geometry(geometry);
                if bounds.is_none() {
                    tracing::warn!(geometry, "Ignoring invalid output geometry");
                }
                bounds.map(|b| {
                    let name = format!("Virtual {}", index + 1);
                    Output::new(OutputId::from_descriptor(&name, index as u32), b)
                })
            })
            .collect();
        Self::new(outputs)
    }

    /// Replace the output set and notify listeners
    pub fn set_outputs(&mut self, outputs: Vec<Output>) {
        self.outputs = outputs;
        self.notify();
    }

    pub fn connect(&mut self, output: Output) {
        self.outputs.push(output);
        self.notify();
    }

    pub fn disconnect(&mut self, id: OutputId) {
        self.outputs.retain(|o| o.id != id);
        self.notify();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }
}

impl DisplaySource for VirtualDisplaySource {
    fn outputs(&self) -> Vec<Output> {
        self.outputs.clone()
    }

    fn subscribe(&mut self, listener: DisplayListener) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}
