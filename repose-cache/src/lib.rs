//! An open-addressed, linear-probing package cache keyed by name.
//!
//! This is an arena-backed reimplementation of `pkgcache.c`'s
//! `struct pkgcache`: the original links bucket entries and a doubly-linked
//! list through raw pointers with split ownership. Here both the bucket
//! array and the iteration list carry indices into a single owning `Vec`
//! (the "arena"), which sidesteps the aliasing the original's raw pointers
//! required while keeping the exact same probing/rehash/removal algorithm
//! (see `repose`'s design notes on "owning graph vs. index").

#![deny(missing_docs)]

use std::fmt;

use repose_types::{sdbm, Package};

/// Primes used as bucket counts, identical to the original's `prime_list`.
/// The cache always uses the smallest prime here that is large enough for
/// the requested capacity at the target load factor.
const PRIME_LIST: &[usize] = &[
    11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 103, 109,
    113, 127, 137, 139, 149, 157, 167, 179, 193, 199, 211, 227, 241, 257, 277, 293, 313, 337, 359,
    383, 409, 439, 467, 503, 541, 577, 619, 661, 709, 761, 823, 887, 953, 1031, 1109, 1193, 1289,
    1381, 1493, 1613, 1741, 1879, 2029, 2179, 2357, 2549, 2753, 2971, 3209, 3469, 3739, 4027,
    4349, 4703, 5087, 5503, 5953, 6427, 6949, 7517, 8123, 8783, 9497, 10273, 11113, 12011, 12983,
    14033, 15173, 16411, 17749, 19183, 20753, 22447, 24281, 26267, 28411, 30727, 33223, 35933,
    38873, 42043, 45481, 49201, 53201, 57557, 62233, 67307, 72817, 78779, 85229, 92203, 99733,
    107897, 116731, 126271, 136607, 147793, 159871, 172933, 187091, 202409, 218971, 236897,
    256279, 277261, 299951, 324503, 351061, 379787, 410857, 444487, 480881, 520241, 562841,
    608903, 658753, 712697, 771049, 834181, 902483, 976369,
];

/// How far forward linear probing looks for the next candidate slot.
const STRIDE: usize = 1;
/// The maximum load percentage before a rehash is triggered.
const MAX_LOAD: f64 = 0.68;
/// The load percentage used to size a freshly created table.
const INITIAL_LOAD: f64 = 0.58;

/// One arena slot: an owned `Package` plus its place in the iteration list.
struct Slot {
    pkg: Package,
    prev: Option<usize>,
    next: Option<usize>,
}

/// An open-addressed package cache.
///
/// Every stored package is reachable in O(1) expected time via [`find`],
/// and `list_head`/iteration preserves either insertion order ([`add`]) or
/// name-sorted order ([`add_sorted`]) depending on which call inserted it.
///
/// [`find`]: PackageCache::find
/// [`add`]: PackageCache::add
/// [`add_sorted`]: PackageCache::add_sorted
pub struct PackageCache {
    slots: Vec<Option<Slot>>,
    free_list: Vec<usize>,
    buckets: Vec<Option<usize>>,
    list_head: Option<usize>,
    list_tail: Option<usize>,
    entries: usize,
    limit: usize,
}

impl fmt::Debug for PackageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageCache")
            .field("entries", &self.entries)
            .field("limit", &self.limit)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

impl PackageCache {
    /// Allocates a cache with bucket space for at least `hint` entries at
    /// the initial load factor.
    pub fn create(hint: usize) -> Self {
        let target = (hint as f64 / INITIAL_LOAD) as usize + 1;
        let buckets = PRIME_LIST
            .iter()
            .copied()
            .find(|&p| p > target)
            .unwrap_or(*PRIME_LIST.last().unwrap());

        PackageCache {
            slots: Vec::new(),
            free_list: Vec::new(),
            buckets: vec![None; buckets],
            list_head: None,
            list_tail: None,
            entries: 0,
            limit: (buckets as f64 * MAX_LOAD) as usize,
        }
    }

    /// Number of packages currently stored.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the cache holds no packages.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    fn hash_position(&self, hash: u32) -> usize {
        let mut position = hash as usize % self.buckets.len();
        while self.buckets[position].is_some() {
            position = (position + STRIDE) % self.buckets.len();
        }
        position
    }

    fn alloc_slot(&mut self, pkg: Package) -> usize {
        let slot = Slot {
            pkg,
            prev: None,
            next: None,
        };
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    fn link_tail(&mut self, idx: usize) {
        self.slots[idx].as_mut().unwrap().prev = self.list_tail;
        self.slots[idx].as_mut().unwrap().next = None;
        if let Some(tail) = self.list_tail {
            self.slots[tail].as_mut().unwrap().next = Some(idx);
        } else {
            self.list_head = Some(idx);
        }
        self.list_tail = Some(idx);
    }

    fn link_sorted(&mut self, idx: usize) {
        let name = self.slots[idx].as_ref().unwrap().pkg.name.clone();

        let mut cursor = self.list_head;
        while let Some(node) = cursor {
            if self.slots[node].as_ref().unwrap().pkg.name > name {
                break;
            }
            cursor = self.slots[node].as_ref().unwrap().next;
        }

        match cursor {
            None => self.link_tail(idx),
            Some(node) => {
                let prev = self.slots[node].as_ref().unwrap().prev;
                self.slots[idx].as_mut().unwrap().prev = prev;
                self.slots[idx].as_mut().unwrap().next = Some(node);
                self.slots[node].as_mut().unwrap().prev = Some(idx);
                match prev {
                    Some(p) => self.slots[p].as_mut().unwrap().next = Some(idx),
                    None => self.list_head = Some(idx),
                }
            }
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slots[idx].as_ref().unwrap();
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p].as_mut().unwrap().next = next,
            None => self.list_head = next,
        }
        match next {
            Some(n) => self.slots[n].as_mut().unwrap().prev = prev,
            None => self.list_tail = prev,
        }
    }

    fn add_pkg(&mut self, pkg: Package, sorted: bool) {
        if self.entries >= self.limit {
            self.rehash();
        }

        let hash = pkg.name_hash;
        let position = self.hash_position(hash);
        let idx = self.alloc_slot(pkg);
        self.buckets[position] = Some(idx);

        if sorted {
            self.link_sorted(idx);
        } else {
            self.link_tail(idx);
        }

        self.entries += 1;
    }

    /// Inserts `pkg`, appending it to the iteration order.
    pub fn add(&mut self, pkg: Package) {
        self.add_pkg(pkg, false);
    }

    /// Inserts `pkg`, keeping the iteration list sorted by name.
    pub fn add_sorted(&mut self, pkg: Package) {
        self.add_pkg(pkg, true);
    }

    /// Looks up a package by name.
    pub fn find(&self, name: &str) -> Option<&Package> {
        let hash = sdbm(name);
        let mut position = hash as usize % self.buckets.len();

        while let Some(idx) = self.buckets[position] {
            let pkg = &self.slots[idx].as_ref().unwrap().pkg;
            if pkg.name_hash == hash && pkg.name == name {
                return Some(pkg);
            }
            position = (position + STRIDE) % self.buckets.len();
        }
        None
    }

    /// Looks up a package by name, returning a mutable reference.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Package> {
        let hash = sdbm(name);
        let mut position = hash as usize % self.buckets.len();

        while let Some(idx) = self.buckets[position] {
            if self.slots[idx].as_ref().unwrap().pkg.name_hash == hash
                && self.slots[idx].as_ref().unwrap().pkg.name == name
            {
                return Some(&mut self.slots[idx].as_mut().unwrap().pkg);
            }
            position = (position + STRIDE) % self.buckets.len();
        }
        None
    }

    /// Moves one entry back into the just-vacated slot `hole`, if any entry
    /// between `hole` and `end` (searched backwards) probes there.
    ///
    /// Ported from `move_one_entry` in `pkgcache.c`: iterating backwards
    /// avoids ever moving more than one item per call, which is what makes
    /// the overall repair loop in [`PackageCache::remove`] terminate cleanly.
    /// The candidate's ideal slot is its *probe* position, not its raw home
    /// bucket — `get_hash_position` in the original walks forward from the
    /// home through whatever is currently occupied, and `hole` is already
    /// vacant in `self.buckets` at this point, so [`PackageCache::hash_position`]
    /// computes exactly that walk.
    fn move_one_entry(&mut self, hole: usize, end: usize) -> usize {
        let b = self.buckets.len();
        let mut cursor = end;
        while cursor != hole {
            let idx = self.buckets[cursor].expect("cursor must point at an occupied bucket");
            let hash = self.slots[idx].as_ref().unwrap().pkg.name_hash;
            let new_position = self.hash_position(hash);

            if new_position == hole {
                self.buckets[hole] = Some(idx);
                self.buckets[cursor] = None;
                break;
            }

            cursor = (b + cursor - STRIDE) % b;
        }
        cursor
    }

    /// Removes the package named `name`, repairing the probe chain so that
    /// every remaining entry stays reachable from its hash position.
    pub fn remove(&mut self, name: &str) -> Option<Package> {
        let hash = sdbm(name);
        let b = self.buckets.len();
        let mut position = hash as usize % b;

        while let Some(idx) = self.buckets[position] {
            let matches = {
                let pkg = &self.slots[idx].as_ref().unwrap().pkg;
                pkg.name_hash == hash && pkg.name == name
            };

            if matches {
                self.unlink(idx);
                self.buckets[position] = None;
                let pkg = self.slots[idx].take().unwrap().pkg;
                self.free_list.push(idx);
                self.entries -= 1;

                // Find the next empty bucket forward from `position`; every
                // occupied slot between here and there might need to shift
                // back to fill the hole we just opened.
                let mut stop = (position + STRIDE) % b;
                while self.buckets[stop].is_some() && stop != position {
                    stop = (stop + STRIDE) % b;
                }
                stop = (b + stop - STRIDE) % b;

                let mut hole = position;
                loop {
                    let moved_to = self.move_one_entry(hole, stop);
                    if moved_to == hole {
                        break;
                    }
                    hole = moved_to;
                }

                return Some(pkg);
            }

            position = (position + STRIDE) % b;
        }

        None
    }

    /// `remove(old_name)` followed by `add(new)`, returning the replaced
    /// package if one existed.
    pub fn replace(&mut self, new: Package, old_name: &str) -> Option<Package> {
        let old = self.remove(old_name);
        self.add(new);
        old
    }

    fn rehash(&mut self) {
        let old_buckets = self.buckets.len();
        let new_buckets = if old_buckets < 500 {
            old_buckets * 2
        } else if old_buckets < 2000 {
            old_buckets * 3 / 2
        } else if old_buckets < 5000 {
            old_buckets * 4 / 3
        } else {
            old_buckets + 1
        };

        let sized = PRIME_LIST
            .iter()
            .copied()
            .find(|&p| p >= new_buckets)
            .unwrap_or(*PRIME_LIST.last().unwrap());

        self.buckets = vec![None; sized];
        self.limit = (sized as f64 * MAX_LOAD) as usize;

        // Re-insert every slot at its new probe position without touching
        // the list links: list order is preserved verbatim across rehash.
        let mut cursor = self.list_head;
        while let Some(idx) = cursor {
            let hash = self.slots[idx].as_ref().unwrap().pkg.name_hash;
            let position = {
                let mut p = hash as usize % self.buckets.len();
                while self.buckets[p].is_some() {
                    p = (p + STRIDE) % self.buckets.len();
                }
                p
            };
            self.buckets[position] = Some(idx);
            cursor = self.slots[idx].as_ref().unwrap().next;
        }
    }

    /// Iterates packages in the cache's list order (insertion or name-sorted,
    /// per how they were added).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cache: self,
            cursor: self.list_head,
        }
    }
}

/// Iterator over a [`PackageCache`]'s list order.
pub struct Iter<'a> {
    cache: &'a PackageCache,
    cursor: Option<usize>,
}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("cursor", &self.cursor).finish()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Package;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = self.cache.slots[idx].as_ref().unwrap();
        self.cursor = slot.next;
        Some(&slot.pkg)
    }
}

impl<'a> IntoIterator for &'a PackageCache {
    type Item = &'a Package;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use repose_types::Package;

    use super::*;

    fn pkg(name: &str) -> Package {
        Package::new(name, format!("{name}-1-1-any.pkg.tar.zst"))
    }

    #[test]
    fn round_trip_find_and_remove() {
        let mut cache = PackageCache::create(16);
        cache.add(pkg("a"));
        cache.add(pkg("b"));
        cache.add(pkg("c"));

        assert!(cache.find("b").is_some());
        let removed = cache.remove("b");
        assert!(removed.is_some());
        assert!(cache.find("b").is_none());
        assert!(cache.find("a").is_some());
        assert!(cache.find("c").is_some());
    }

    #[test]
    fn probe_repair_after_partial_removal() {
        // Force heavy collisions with a tiny table so every name lands in
        // the same starting bucket's probe chain.
        let mut cache = PackageCache::create(2);
        let names: Vec<String> = (0..10).map(|i| format!("pkg{i}")).collect();
        for n in &names {
            cache.add(pkg(n));
        }

        // Remove every other entry and make sure the rest are still
        // reachable via the repaired probe chain.
        for (i, n) in names.iter().enumerate() {
            if i % 2 == 0 {
                assert!(cache.remove(n).is_some());
            }
        }
        for (i, n) in names.iter().enumerate() {
            if i % 2 == 0 {
                assert!(cache.find(n).is_none(), "{n} should have been removed");
            } else {
                assert!(cache.find(n).is_some(), "{n} should still be findable");
            }
        }
    }

    #[test]
    fn probe_repair_moves_entry_whose_home_is_occupied() {
        // Construct the exact collision the backward-shift repair has to get
        // right: "bb" and "w1" both hash to bucket 4 on an 11-bucket table,
        // "w2" hashes to bucket 5. Inserted in this order, "bb" takes bucket
        // 4, "w2" takes bucket 5, and "w1" probes past both to land in
        // bucket 6. Removing "w2" must shift "w1" back into bucket 5 (its
        // probe position with "w2" gone), not leave it stranded in bucket 6
        // behind an empty bucket 5 — that would make `find("w1")` stop
        // early at the hole and report it missing.
        let mut cache = PackageCache::create(2);
        cache.add(pkg("bb"));
        cache.add(pkg("w2"));
        cache.add(pkg("w1"));

        assert!(cache.remove("w2").is_some());
        assert!(cache.find("bb").is_some());
        assert!(
            cache.find("w1").is_some(),
            "w1 must still be reachable after its home-bucket neighbour's slot was vacated"
        );
    }

    #[test]
    fn rehash_preserves_insertion_order() {
        let mut cache = PackageCache::create(2);
        let names: Vec<String> = (0..50).map(|i| format!("pkg{i:02}")).collect();
        for n in &names {
            cache.add(pkg(n));
        }

        let observed: Vec<String> = cache.iter().map(|p| p.name.clone()).collect();
        assert_eq!(observed, names);
    }

    #[test]
    fn add_sorted_keeps_list_ordered_by_name() {
        let mut cache = PackageCache::create(8);
        for n in ["charlie", "alpha", "bravo"] {
            cache.add_sorted(pkg(n));
        }
        let observed: Vec<String> = cache.iter().map(|p| p.name.clone()).collect();
        assert_eq!(observed, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn replace_transfers_ownership_and_updates_list_position() {
        let mut cache = PackageCache::create(8);
        cache.add(pkg("a"));
        cache.add(pkg("b"));

        let mut new_a = pkg("a");
        new_a.size = 42;
        let old = cache.replace(new_a, "a");
        assert_eq!(old.unwrap().name, "a");
        assert_eq!(cache.find("a").unwrap().size, 42);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn remove_missing_name_is_a_no_op() {
        let mut cache = PackageCache::create(8);
        cache.add(pkg("a"));
        assert!(cache.remove("does-not-exist").is_none());
        assert_eq!(cache.len(), 1);
    }
}
