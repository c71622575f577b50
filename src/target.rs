//! Logical targets
//!
//! A [`LogicalTarget`] orchestrates N triples maps round-robin: each drain
//! tick pulls exactly one record's worth of triples from every map that is
//! not yet exhausted and forwards them to the sink. This
//! round-robin-across-maps, depth-first-within-record ordering makes
//! multi-map interleaving deterministic.

use tracing::debug;

use crate::error::RmlResult;
use crate::mapping::TriplesMap;
use crate::term::Triple;

/// Downstream boundary: receives generated triples in order.
///
/// Serialization format is owned by the sink, not the engine.
pub trait TripleSink {
    /// Accept one triple
    fn write(&mut self, triple: &Triple) -> RmlResult<()>;
}

/// Sink that collects triples in memory
#[derive(Debug, Default)]
pub struct VecSink {
    /// Collected triples in arrival order
    pub triples: Vec<Triple>,
}

impl VecSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripleSink for VecSink {
    fn write(&mut self, triple: &Triple) -> RmlResult<()> {
        self.triples.push(triple.clone());
        Ok(())
    }
}

struct MapSlot {
    map: TriplesMap,
    exhausted: bool,
}

/// Round-robin driver over a set of triples maps
pub struct LogicalTarget {
    slots: Vec<MapSlot>,
    exhausted_count: usize,
}

impl LogicalTarget {
    /// Create a target over an ordered list of maps
    pub fn new(maps: Vec<TriplesMap>) -> Self {
        Self {
            slots: maps
                .into_iter()
                .map(|map| MapSlot {
                    map,
                    exhausted: false,
                })
                .collect(),
            exhausted_count: 0,
        }
    }

    /// Run one drain tick.
    ///
    /// Every not-yet-exhausted map contributes at most one record's triples,
    /// in map declaration order. Returns the number of triples written, or
    /// `Ok(None)` once every map is exhausted; the exhausted tick performs
    /// no writes.
    pub fn drain_one(&mut self, sink: &mut dyn TripleSink) -> RmlResult<Option<usize>> {
        if self.exhausted_count == self.slots.len() {
            return Ok(None);
        }

        let mut written = 0;
        for slot in self.slots.iter_mut().filter(|s| !s.exhausted) {
            match slot.map.advance()? {
                Some(triples) => {
                    for triple in &triples {
                        sink.write(triple)?;
                    }
                    written += triples.len();
                }
                None => {
                    debug!(map = %slot.map.name(), "triples map exhausted");
                    slot.exhausted = true;
                    self.exhausted_count += 1;
                }
            }
        }

        if written == 0 && self.exhausted_count == self.slots.len() {
            return Ok(None);
        }
        Ok(Some(written))
    }

    /// Drain every map to exhaustion, returning the total triple count
    pub fn drain_all(&mut self, sink: &mut dyn TripleSink) -> RmlResult<usize> {
        let mut total = 0;
        while let Some(written) = self.drain_one(sink)? {
            total += written;
        }
        Ok(total)
    }
}
