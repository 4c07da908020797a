use std::collections::HashMap;

/// Number of samples kept per page and metric.
pub const WINDOW_SIZE: usize = 4;

/// Which per-page series a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Status,
    ElementCount,
}

/// Fixed-size window of the most recent samples, oldest first.
///
/// Slots that have not been observed yet hold `None`, the startup sentinel.
/// An observed `0` (failed probe, empty page) is a real value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryWindow {
    slots: [Option<u32>; WINDOW_SIZE],
}

impl HistoryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: [Option<u32>; WINDOW_SIZE]) -> Self {
        Self { slots }
    }

    /// A fully observed window.
    pub fn from_values(values: [u32; WINDOW_SIZE]) -> Self {
        Self {
            slots: values.map(Some),
        }
    }

    pub fn slots(&self) -> [Option<u32>; WINDOW_SIZE] {
        self.slots
    }

    pub fn oldest(&self) -> Option<u32> {
        self.slots[0]
    }

    pub fn newest(&self) -> Option<u32> {
        self.slots[WINDOW_SIZE - 1]
    }

    /// Returns the window as it would look after `value` is pushed.
    pub fn advanced(&self, value: u32) -> Self {
        let mut next = *self;
        next.slots.rotate_left(1);
        next.slots[WINDOW_SIZE - 1] = Some(value);
        next
    }

    /// Shifts `value` in as the newest entry and returns the window before the push.
    pub fn push(&mut self, value: u32) -> Self {
        let previous = *self;
        *self = self.advanced(value);
        previous
    }

    /// `(old, new)` when the three newest samples agree on `new` and the
    /// oldest slot holds a different, really observed `old`.
    pub fn settled_transition(&self) -> Option<(u32, u32)> {
        let [w0, w1, w2, w3] = self.slots;
        let old = w0?;
        let new = w3?;
        (w1 == w2 && w2 == w3 && old != new).then_some((old, new))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PageHistory {
    status: HistoryWindow,
    element_count: HistoryWindow,
}

impl PageHistory {
    fn window_mut(&mut self, metric: Metric) -> &mut HistoryWindow {
        match metric {
            Metric::Status => &mut self.status,
            Metric::ElementCount => &mut self.element_count,
        }
    }

    fn window(&self, metric: Metric) -> HistoryWindow {
        match metric {
            Metric::Status => self.status,
            Metric::ElementCount => self.element_count,
        }
    }
}

/// Rolling per-page sample windows for status and element count.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    pages: HashMap<String, PageHistory>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the page's `metric` window and returns the window
    /// as it was before the push. Unknown pages start from an unobserved window.
    pub fn push(&mut self, page_id: &str, metric: Metric, value: u32) -> HistoryWindow {
        if let Some(history) = self.pages.get_mut(page_id) {
            return history.window_mut(metric).push(value);
        }

        let mut history = PageHistory::default();
        let previous = history.window_mut(metric).push(value);
        self.pages.insert(page_id.to_string(), history);
        previous
    }

    pub fn window(&self, page_id: &str, metric: Metric) -> Option<HistoryWindow> {
        self.pages.get(page_id).map(|history| history.window(metric))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
