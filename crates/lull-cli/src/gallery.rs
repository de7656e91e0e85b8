//! Gallery - スクロールする行リストのシミュレーション
//!
//! 各行は画像スロットを 3 つ持つ。行が表示されたら同期的にプレースホルダで
//! 描画し、画像の割り当ては IdleDeferral に任せる。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use lull_core::{IdleDeferral, IdleTask, LoopContext, LoopMode, Step};
use serde::Serialize;
use tracing::{trace, warn};

pub const SLOTS_PER_ROW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListEvent {
    DragBegan,
    ScrolledBy(f64),
    DragEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageSlot {
    Placeholder,
    Loaded { bytes: usize },
}

#[derive(Debug)]
pub struct Cell {
    pub row: usize,
    pub slots: [ImageSlot; SLOTS_PER_ROW],
}

impl Cell {
    fn placeholder(row: usize) -> Self {
        Self {
            row,
            slots: [ImageSlot::Placeholder; SLOTS_PER_ROW],
        }
    }

    fn assign(&mut self, image: ImageSlot) {
        self.slots = [image; SLOTS_PER_ROW];
    }

    pub fn is_loaded(&self) -> bool {
        self.slots.iter().all(|slot| *slot != ImageSlot::Placeholder)
    }
}

/// Deferred work for one row: read the image file and assign it to the cell.
///
/// Always returns `Step::Continue`; a missing file or a recycled cell leaves
/// the placeholder and lets the drain go on.
pub struct AssignImage {
    cell: Weak<RefCell<Cell>>,
    path: PathBuf,
}

impl IdleTask for AssignImage {
    fn run(self: Box<Self>) -> Step {
        let Some(cell) = self.cell.upgrade() else {
            trace!("cell recycled before its image arrived");
            return Step::Continue;
        };
        match fs::read(&self.path) {
            Ok(bytes) => cell.borrow_mut().assign(ImageSlot::Loaded { bytes: bytes.len() }),
            Err(error) => {
                warn!(path = %self.path.display(), %error, row = cell.borrow().row, "image unavailable; keeping placeholder");
            }
        }
        Step::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub rows: usize,
    pub row_height: f64,
    pub viewport: f64,
}

impl Layout {
    fn max_offset(&self) -> f64 {
        (self.rows as f64 * self.row_height - self.viewport).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GallerySummary {
    pub offset: f64,
    pub rows_rendered: u64,
    pub visible: Vec<usize>,
    pub loaded: usize,
}

pub struct Gallery {
    layout: Layout,
    image: PathBuf,
    deferral: IdleDeferral,
    offset: f64,
    cells: BTreeMap<usize, Rc<RefCell<Cell>>>,
    rows_rendered: u64,
}

impl Gallery {
    pub fn new(layout: Layout, image: PathBuf, deferral: IdleDeferral) -> Self {
        Self {
            layout,
            image,
            deferral,
            offset: 0.0,
            cells: BTreeMap::new(),
            rows_rendered: 0,
        }
    }

    pub fn deferral(&self) -> &IdleDeferral {
        &self.deferral
    }

    pub fn handle(&mut self, event: ListEvent, cx: &LoopContext) {
        match event {
            ListEvent::DragBegan => cx.set_mode(LoopMode::Tracking),
            ListEvent::ScrolledBy(delta) => self.scroll_by(delta),
            ListEvent::DragEnded => cx.set_mode(LoopMode::Default),
        }
    }

    pub fn visible_rows(&self) -> Range<usize> {
        if self.layout.rows == 0 {
            return 0..0;
        }
        let first = (self.offset / self.layout.row_height).floor() as usize;
        let last = ((self.offset + self.layout.viewport) / self.layout.row_height).ceil() as usize;
        first.min(self.layout.rows)..last.min(self.layout.rows)
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.offset = (self.offset + delta).clamp(0.0, self.layout.max_offset());
        self.layout_visible();
    }

    /// Drop off-screen cells and render rows that just came into view.
    pub fn layout_visible(&mut self) {
        let visible = self.visible_rows();
        self.cells.retain(|row, _| visible.contains(row));
        for row in visible {
            if !self.cells.contains_key(&row) {
                self.render_row(row);
            }
        }
    }

    fn render_row(&mut self, row: usize) {
        let cell = Rc::new(RefCell::new(Cell::placeholder(row)));
        self.deferral.submit(AssignImage {
            cell: Rc::downgrade(&cell),
            path: self.image.clone(),
        });
        self.cells.insert(row, cell);
        self.rows_rendered += 1;
    }

    /// Get the cell rendered for `row` (for testing)
    #[cfg(test)]
    pub fn cell(&self, row: usize) -> Option<Rc<RefCell<Cell>>> {
        self.cells.get(&row).cloned()
    }

    pub fn summary(&self) -> GallerySummary {
        GallerySummary {
            offset: self.offset,
            rows_rendered: self.rows_rendered,
            visible: self.cells.keys().copied().collect(),
            loaded: self
                .cells
                .values()
                .filter(|cell| cell.borrow().is_loaded())
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use lull_core::{Activity, Capacity, ObserverRegistry};

    use super::*;

    const LAYOUT: Layout = Layout {
        rows: 100,
        row_height: 120.0,
        viewport: 600.0,
    };

    fn image_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        file
    }

    fn deferred(registry: &ObserverRegistry) -> IdleDeferral {
        IdleDeferral::attach(Rc::new(registry.clone()), Capacity::new(7).unwrap()).unwrap()
    }

    fn idle(registry: &ObserverRegistry, mode: LoopMode) {
        registry.fire(Activity::BEFORE_WAITING, mode);
    }

    #[test]
    fn visible_rows_follow_offset() {
        let mut gallery = Gallery::new(
            LAYOUT,
            PathBuf::from("unused"),
            IdleDeferral::immediate(Capacity::new(7).unwrap()),
        );
        assert_eq!(gallery.visible_rows(), 0..5);
        gallery.scroll_by(60.0);
        assert_eq!(gallery.visible_rows(), 0..6);
        gallery.scroll_by(1_000_000.0);
        assert_eq!(gallery.visible_rows(), 95..100);
        gallery.scroll_by(-1_000_000.0);
        assert_eq!(gallery.visible_rows(), 0..5);
    }

    #[test]
    fn rows_render_placeholders_then_load_on_idle() {
        let image = image_file();
        let registry = ObserverRegistry::new();
        let mut gallery = Gallery::new(LAYOUT, image.path().to_path_buf(), deferred(&registry));

        gallery.layout_visible();
        let cell = gallery.cell(0).unwrap();
        assert_eq!(cell.borrow().slots, [ImageSlot::Placeholder; SLOTS_PER_ROW]);

        idle(&registry, LoopMode::Default);
        assert_eq!(cell.borrow().slots, [ImageSlot::Loaded { bytes: 64 }; SLOTS_PER_ROW]);
        assert_eq!(gallery.summary().loaded, 5);
    }

    #[test]
    fn fast_scroll_abandons_offscreen_rows() {
        let image = image_file();
        let registry = ObserverRegistry::new();
        let mut gallery = Gallery::new(LAYOUT, image.path().to_path_buf(), deferred(&registry));
        let cx = LoopContext::default();

        gallery.handle(ListEvent::DragBegan, &cx);
        for _ in 0..20 {
            gallery.handle(ListEvent::ScrolledBy(240.0), &cx);
            idle(&registry, cx.mode());
        }
        // Nothing ran while tracking; the queue kept only the newest seven rows.
        assert_eq!(gallery.summary().loaded, 0);
        assert_eq!(gallery.deferral().pending(), 7);

        gallery.handle(ListEvent::DragEnded, &cx);
        idle(&registry, cx.mode());

        let summary = gallery.summary();
        assert_eq!(summary.visible, (40..45).collect::<Vec<_>>());
        assert_eq!(summary.loaded, 5);
        let counts = gallery.deferral().counts();
        assert_eq!(counts.executed, 7);
        assert_eq!(counts.evicted, summary.rows_rendered - 7);
    }

    #[test]
    fn missing_image_keeps_placeholder_and_continues() {
        let registry = ObserverRegistry::new();
        let mut gallery = Gallery::new(
            LAYOUT,
            PathBuf::from("/nonexistent/rose.jpg"),
            deferred(&registry),
        );
        gallery.layout_visible();
        idle(&registry, LoopMode::Default);

        assert_eq!(gallery.summary().loaded, 0);
        assert_eq!(gallery.deferral().pending(), 0);
        assert_eq!(gallery.deferral().counts().executed, 5);
    }

    #[test]
    fn immediate_mode_loads_synchronously() {
        let image = image_file();
        let mut gallery = Gallery::new(
            LAYOUT,
            image.path().to_path_buf(),
            IdleDeferral::immediate(Capacity::new(7).unwrap()),
        );
        gallery.layout_visible();
        assert_eq!(gallery.summary().loaded, 5);
    }
}
