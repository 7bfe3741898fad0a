//! [`ShelfLocationResolver`] – turns shelf and location names into the ids
//! the service requires.
//!
//! The resolver holds a cached catalog snapshot (shelves + locations).  The
//! snapshot is immutable; refreshing it swaps in a whole new one through an
//! [`ArcSwap`], so readers never take a lock and never observe a catalog that
//! is half old, half new.
//!
//! # Resolution rules
//!
//! * An input equal to the `name` of a cached entry resolves to that entry's
//!   `id`.
//! * Anything else is returned unchanged: the caller may legitimately pass an
//!   id, and the service is the authority that rejects unknown ids.
//! * The empty string is always passed through.  It means "no explicit
//!   target" for commands such as returning the most recently held shelf.
//! * When several entries share a name the first one in catalog order wins
//!   and a warning is logged.
//!
//! # Example
//!
//! ```
//! use kachaka_client::resolver::ShelfLocationResolver;
//! use kachaka_types::Shelf;
//!
//! let resolver = ShelfLocationResolver::new();
//! resolver.set_shelves(vec![Shelf::new("S1", "kitchen-cart")]);
//!
//! assert_eq!(resolver.resolve_shelf("kitchen-cart"), "S1");
//! assert_eq!(resolver.resolve_shelf("S9"), "S9");
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use kachaka_types::{Location, Shelf};
use tracing::warn;

/// Something the resolver can look up by name.
trait CatalogEntry {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl CatalogEntry for Shelf {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogEntry for Location {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
struct Catalog {
    shelves: Arc<Vec<Shelf>>,
    locations: Arc<Vec<Location>>,
}

/// Name-to-id resolver over a swappable catalog snapshot.
///
/// Starts empty; every name resolves to itself until a catalog is installed.
#[derive(Debug)]
pub struct ShelfLocationResolver {
    catalog: ArcSwap<Catalog>,
}

impl Default for ShelfLocationResolver {
    fn default() -> Self {
        Self {
            catalog: ArcSwap::from_pointee(Catalog::default()),
        }
    }
}

impl ShelfLocationResolver {
    /// Create a resolver with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached shelf list wholesale.  Locations are kept.
    pub fn set_shelves(&self, shelves: Vec<Shelf>) {
        let shelves = Arc::new(shelves);
        self.catalog.rcu(|current| Catalog {
            shelves: Arc::clone(&shelves),
            locations: Arc::clone(&current.locations),
        });
    }

    /// Replace the cached location list wholesale.  Shelves are kept.
    pub fn set_locations(&self, locations: Vec<Location>) {
        let locations = Arc::new(locations);
        self.catalog.rcu(|current| Catalog {
            shelves: Arc::clone(&current.shelves),
            locations: Arc::clone(&locations),
        });
    }

    /// Replace both lists in a single swap.
    pub fn set_catalog(&self, shelves: Vec<Shelf>, locations: Vec<Location>) {
        self.catalog.store(Arc::new(Catalog {
            shelves: Arc::new(shelves),
            locations: Arc::new(locations),
        }));
    }

    /// Resolve a shelf name to its id, or return `name_or_id` unchanged.
    pub fn resolve_shelf(&self, name_or_id: &str) -> String {
        let catalog = self.catalog.load();
        resolve_in("shelf", &catalog.shelves, name_or_id)
    }

    /// Resolve a location name to its id, or return `name_or_id` unchanged.
    pub fn resolve_location(&self, name_or_id: &str) -> String {
        let catalog = self.catalog.load();
        resolve_in("location", &catalog.locations, name_or_id)
    }
}

fn resolve_in<E: CatalogEntry>(kind: &'static str, entries: &[E], name_or_id: &str) -> String {
    if name_or_id.is_empty() {
        return String::new();
    }
    let mut matches = entries.iter().filter(|e| e.name() == name_or_id);
    let Some(first) = matches.next() else {
        return name_or_id.to_string();
    };
    let duplicates = matches.count();
    if duplicates > 0 {
        warn!(
            kind,
            name = name_or_id,
            chosen_id = first.id(),
            duplicates,
            "ambiguous name in catalog; using first match"
        );
    }
    first.id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shelves() -> Vec<Shelf> {
        vec![
            Shelf::new("S1", "kitchen-cart"),
            Shelf::new("S2", "laundry"),
        ]
    }

    fn locations() -> Vec<Location> {
        vec![
            Location::new("L1", "living-room"),
            Location::new("L2", "bedroom"),
        ]
    }

    #[test]
    fn empty_resolver_passes_everything_through() {
        let resolver = ShelfLocationResolver::new();
        assert_eq!(resolver.resolve_shelf("kitchen-cart"), "kitchen-cart");
        assert_eq!(resolver.resolve_location("L1"), "L1");
    }

    #[test]
    fn unique_name_resolves_to_id() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_catalog(shelves(), locations());
        for shelf in shelves() {
            assert_eq!(resolver.resolve_shelf(&shelf.name), shelf.id);
        }
        for location in locations() {
            assert_eq!(resolver.resolve_location(&location.name), location.id);
        }
    }

    #[test]
    fn unmatched_input_is_returned_unchanged() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_catalog(shelves(), locations());
        assert_eq!(resolver.resolve_shelf("S9"), "S9");
        assert_eq!(resolver.resolve_shelf("S1"), "S1");
        assert_eq!(resolver.resolve_location("garage"), "garage");
    }

    #[test]
    fn shelf_names_do_not_resolve_as_locations() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_catalog(shelves(), locations());
        assert_eq!(resolver.resolve_location("kitchen-cart"), "kitchen-cart");
        assert_eq!(resolver.resolve_shelf("bedroom"), "bedroom");
    }

    #[test]
    fn empty_input_stays_empty_even_with_unnamed_entry() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_shelves(vec![Shelf::new("S0", "")]);
        assert_eq!(resolver.resolve_shelf(""), "");
    }

    #[test]
    fn duplicate_names_resolve_to_first_match() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_shelves(vec![
            Shelf::new("S1", "cart"),
            Shelf::new("S2", "cart"),
        ]);
        assert_eq!(resolver.resolve_shelf("cart"), "S1");
    }

    #[test]
    fn set_shelves_replaces_wholesale() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_shelves(shelves());
        resolver.set_shelves(vec![Shelf::new("S7", "kitchen-cart")]);

        assert_eq!(resolver.resolve_shelf("kitchen-cart"), "S7");
        // "laundry" was only in the old list.
        assert_eq!(resolver.resolve_shelf("laundry"), "laundry");
    }

    #[test]
    fn set_shelves_keeps_locations_and_vice_versa() {
        let resolver = ShelfLocationResolver::new();
        resolver.set_catalog(shelves(), locations());

        resolver.set_shelves(vec![Shelf::new("S3", "tools")]);
        assert_eq!(resolver.resolve_location("bedroom"), "L2");

        resolver.set_locations(vec![Location::new("L9", "garage")]);
        assert_eq!(resolver.resolve_shelf("tools"), "S3");
        assert_eq!(resolver.resolve_location("bedroom"), "bedroom");
    }

    #[test]
    fn readers_never_observe_a_mixed_catalog() {
        let resolver = Arc::new(ShelfLocationResolver::new());
        resolver.set_catalog(
            vec![Shelf::new("S-old", "cart")],
            vec![Location::new("L-old", "dock")],
        );

        let writer = {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || {
                for i in 0..500 {
                    let tag = if i % 2 == 0 { "new" } else { "old" };
                    resolver.set_catalog(
                        vec![Shelf::new(format!("S-{tag}"), "cart")],
                        vec![Location::new(format!("L-{tag}"), "dock")],
                    );
                }
            })
        };

        for _ in 0..500 {
            let catalog = resolver.catalog.load();
            let shelf = resolve_in("shelf", &catalog.shelves, "cart");
            let location = resolve_in("location", &catalog.locations, "dock");
            assert_eq!(
                shelf.trim_start_matches("S-"),
                location.trim_start_matches("L-"),
                "snapshot mixed shelves and locations from different refreshes"
            );
        }
        writer.join().unwrap();
    }
}
