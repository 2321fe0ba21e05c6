use ahash::{AHashMap, AHashSet};

use crate::error::{Result, SimError};
use crate::{BlockId, Direction, LineDef, StationId};

/// Static single-track topology: `blocks[i]` joins `stations[i]` and
/// `stations[i + 1]`. Immutable once built.
#[derive(Debug, Clone)]
pub struct Line {
    stations: Vec<StationId>,
    blocks: Vec<BlockId>,
    block_index: AHashMap<BlockId, usize>,
}

impl Line {
    pub fn new(stations: Vec<StationId>, blocks: Vec<BlockId>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(SimError::LineHasNoBlocks);
        }
        if stations.len() != blocks.len() + 1 {
            return Err(SimError::LineStationsBlocksMismatch {
                stations: stations.len(),
                blocks: blocks.len(),
            });
        }

        let mut seen = AHashSet::with_capacity(stations.len());
        for station in &stations {
            if !seen.insert(station) {
                return Err(SimError::LineDuplicateStationId(station.clone()));
            }
        }

        let mut block_index = AHashMap::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            if block_index.insert(block.clone(), index).is_some() {
                return Err(SimError::LineDuplicateBlockId(block.clone()));
            }
        }

        Ok(Self {
            stations,
            blocks,
            block_index,
        })
    }

    /// Builds a line from its exchange form, checking that every block runs
    /// from station `i` to station `i + 1` before anything else.
    pub fn from_def(def: &LineDef) -> Result<Self> {
        if def.blocks.len() + 1 == def.stations.len() {
            for (i, block) in def.blocks.iter().enumerate() {
                if block.from_station_id != def.stations[i].id
                    || block.to_station_id != def.stations[i + 1].id
                {
                    return Err(SimError::LineConnectivityInvalid {
                        block: block.id.to_string(),
                    });
                }
            }
        }
        let stations = def.stations.iter().map(|s| s.id.clone()).collect();
        let blocks = def.blocks.iter().map(|b| b.id.clone()).collect();
        Self::new(stations, blocks)
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_at(&self, index: usize) -> Option<&BlockId> {
        self.blocks.get(index)
    }

    pub fn index_of_block(&self, id: &BlockId) -> Option<usize> {
        self.block_index.get(id).copied()
    }

    pub fn has_block(&self, id: &BlockId) -> bool {
        self.block_index.contains_key(id)
    }

    /// Stations at either end of `id`, ordered `(from, to)` in the forward sense.
    pub fn block_ends(&self, id: &BlockId) -> Result<(&StationId, &StationId)> {
        let index = self
            .index_of_block(id)
            .ok_or_else(|| SimError::BlockNotFound(id.clone()))?;
        Ok((&self.stations[index], &self.stations[index + 1]))
    }

    /// The block adjacent to `id` in `direction`, or `None` at a terminus.
    pub fn next_block(&self, id: &BlockId, direction: Direction) -> Result<Option<&BlockId>> {
        let index = self
            .index_of_block(id)
            .ok_or_else(|| SimError::BlockNotFound(id.clone()))?;
        let next = match direction {
            Direction::Forward => index.checked_add(1),
            Direction::Backward => index.checked_sub(1),
        };
        Ok(next.and_then(|i| self.blocks.get(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockDef, StationDef};

    fn sid(id: &str) -> StationId {
        StationId::new(id).unwrap()
    }

    fn bid(id: &str) -> BlockId {
        BlockId::new(id).unwrap()
    }

    fn three_block_line() -> Line {
        Line::new(
            vec![sid("S0"), sid("S1"), sid("S2"), sid("S3")],
            vec![bid("B0"), bid("B1"), bid("B2")],
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_blocks() {
        let err = Line::new(vec![sid("S0")], vec![]).unwrap_err();
        assert_eq!(err, SimError::LineHasNoBlocks);
    }

    #[test]
    fn rejects_station_count_mismatch() {
        let err = Line::new(vec![sid("S0"), sid("S1")], vec![bid("B0"), bid("B1")]).unwrap_err();
        assert_eq!(
            err,
            SimError::LineStationsBlocksMismatch {
                stations: 2,
                blocks: 2
            }
        );
    }

    #[test]
    fn rejects_duplicate_station() {
        let err = Line::new(vec![sid("S0"), sid("S0")], vec![bid("B0")]).unwrap_err();
        assert_eq!(err, SimError::LineDuplicateStationId(sid("S0")));
    }

    #[test]
    fn rejects_duplicate_block() {
        let err = Line::new(
            vec![sid("S0"), sid("S1"), sid("S2")],
            vec![bid("B0"), bid("B0")],
        )
        .unwrap_err();
        assert_eq!(err, SimError::LineDuplicateBlockId(bid("B0")));
    }

    #[test]
    fn exposes_topology_in_order() {
        let line = three_block_line();
        assert_eq!(line.stations().len(), 4);
        assert_eq!(line.block_count(), 3);
        assert_eq!(line.block_at(1), Some(&bid("B1")));
        assert_eq!(line.block_at(3), None);
        assert_eq!(line.index_of_block(&bid("B2")), Some(2));
        assert!(!line.has_block(&bid("B9")));
        let (from, to) = line.block_ends(&bid("B1")).unwrap();
        assert_eq!((from.as_str(), to.as_str()), ("S1", "S2"));
    }

    #[test]
    fn next_block_walks_both_directions() {
        let line = three_block_line();
        assert_eq!(
            line.next_block(&bid("B1"), Direction::Forward).unwrap(),
            Some(&bid("B2"))
        );
        assert_eq!(
            line.next_block(&bid("B1"), Direction::Backward).unwrap(),
            Some(&bid("B0"))
        );
    }

    #[test]
    fn next_block_is_none_at_termini() {
        let line = three_block_line();
        assert_eq!(line.next_block(&bid("B0"), Direction::Backward).unwrap(), None);
        assert_eq!(line.next_block(&bid("B2"), Direction::Forward).unwrap(), None);
    }

    #[test]
    fn next_block_unknown_id_fails() {
        let line = three_block_line();
        assert_eq!(
            line.next_block(&bid("B9"), Direction::Forward),
            Err(SimError::BlockNotFound(bid("B9")))
        );
    }

    fn def(pairs: &[(&str, &str)]) -> LineDef {
        LineDef {
            stations: ["S0", "S1", "S2"]
                .iter()
                .map(|s| StationDef { id: sid(s) })
                .collect(),
            blocks: pairs
                .iter()
                .enumerate()
                .map(|(i, (from, to))| BlockDef {
                    id: bid(&format!("B{i}")),
                    from_station_id: sid(from),
                    to_station_id: sid(to),
                })
                .collect(),
            trains: vec![],
        }
    }

    #[test]
    fn from_def_accepts_chained_blocks() {
        let line = Line::from_def(&def(&[("S0", "S1"), ("S1", "S2")])).unwrap();
        assert_eq!(line.block_count(), 2);
    }

    #[test]
    fn from_def_rejects_broken_adjacency() {
        let err = Line::from_def(&def(&[("S0", "S2"), ("S1", "S2")])).unwrap_err();
        assert_eq!(
            err,
            SimError::LineConnectivityInvalid {
                block: "B0".to_string()
            }
        );
    }

    #[test]
    fn from_def_reports_count_mismatch_before_adjacency() {
        let err = Line::from_def(&def(&[("S0", "S1")])).unwrap_err();
        assert!(matches!(err, SimError::LineStationsBlocksMismatch { .. }));
    }
}
