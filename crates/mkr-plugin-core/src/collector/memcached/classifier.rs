//! Maps per-slab-class counters from `stats slabs` / `stats items` onto
//! hierarchical metric names.
//!
//! Only counters listed in [`SLAB_COUNTERS`] are kept; anything else the
//! server reports is dropped.

use std::borrow::Cow;

/// Naming template a slab counter is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlabTemplate {
    /// `hits.slab.class{NN}.{counter}`
    Hits,
    /// `{counter}.slab.class{NN}.{counter}`
    SelfNamed,
    /// `number_of_items.slab.class{NN}.{counter}`
    NumberOfItems,
}

impl SlabTemplate {
    /// Graph key (with `#` standing for the class) the counter belongs to.
    pub fn graph_key(self, counter: &str) -> String {
        match self {
            SlabTemplate::Hits => "hits.slab.#".to_string(),
            SlabTemplate::SelfNamed => format!("{counter}.slab.#"),
            SlabTemplate::NumberOfItems => "number_of_items.slab.#".to_string(),
        }
    }

    fn render(self, class: &str, counter: &str) -> String {
        match self {
            SlabTemplate::Hits => format!("hits.slab.class{class}.{counter}"),
            SlabTemplate::SelfNamed => format!("{counter}.slab.class{class}.{counter}"),
            SlabTemplate::NumberOfItems => {
                format!("number_of_items.slab.class{class}.{counter}")
            }
        }
    }
}

/// Allow-list of slab counters and their templates.
pub static SLAB_COUNTERS: &[(&str, SlabTemplate)] = &[
    ("get_hits", SlabTemplate::Hits),
    ("cmd_set", SlabTemplate::Hits),
    ("delete_hits", SlabTemplate::Hits),
    ("incr_hits", SlabTemplate::Hits),
    ("decr_hits", SlabTemplate::Hits),
    ("cas_hits", SlabTemplate::Hits),
    ("cas_badval", SlabTemplate::Hits),
    ("touch_hits", SlabTemplate::Hits),
    ("mem_requested", SlabTemplate::SelfNamed),
    ("evicted_time", SlabTemplate::SelfNamed),
    ("expired_unfetched", SlabTemplate::NumberOfItems),
    ("evicted_unfetched", SlabTemplate::NumberOfItems),
    ("crawler_reclaimed", SlabTemplate::NumberOfItems),
    ("crawler_items_checked", SlabTemplate::NumberOfItems),
    ("lrutail_reflocked", SlabTemplate::NumberOfItems),
];

/// Looks up the template of an allow-listed counter.
pub fn template_for(counter: &str) -> Option<SlabTemplate> {
    SLAB_COUNTERS
        .iter()
        .find(|(name, _)| *name == counter)
        .map(|(_, template)| *template)
}

/// Builds the metric name for `counter` of slab `class`, or `None` when the
/// counter is not allow-listed.
pub fn classify(class: &str, counter: &str) -> Option<String> {
    let template = template_for(counter)?;
    Some(template.render(&pad_class(class), counter))
}

/// Class indexes are at least two digits wide.
fn pad_class(class: &str) -> Cow<'_, str> {
    if class.len() == 1 {
        Cow::Owned(format!("0{class}"))
    } else {
        Cow::Borrowed(class)
    }
}

/// Key from a `stats slabs` line: `<class>:<counter>`.
///
/// Slab-wide keys without a class (`active_slabs`, `total_malloced`) yield `None`.
pub fn slabs_key(raw: &str) -> Option<String> {
    let mut parts = raw.split(':');
    match (parts.next(), parts.next()) {
        (Some(class), Some(counter)) => classify(class, counter),
        _ => None,
    }
}

/// Key from a `stats items` line: `items:<class>:<counter>`.
pub fn items_key(raw: &str) -> Option<String> {
    let mut parts = raw.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(class), Some(counter)) => classify(class, counter),
        _ => None,
    }
}
