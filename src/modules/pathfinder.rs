//! Breadth-first search over the confirmed edges of the room graph.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::modules::graph::{Direction, RoomGraph, RoomId};

/// One hop: leave the previous room by `direction` and arrive in `room`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub room: RoomId,
    pub direction: Direction,
}

impl Step {
    pub const fn new(room: RoomId, direction: Direction) -> Self {
        Self { room, direction }
    }
}

pub type Path = Vec<Step>;

/// Shortest path from `from` to `to` over resolved edges.
///
/// Returns an empty path when both ends are the same room, `None` if `to` is unreachable
/// with current knowledge.
pub fn find_path(graph: &RoomGraph, from: RoomId, to: RoomId) -> Option<Path> {
    if from == to {
        return Some(Vec::new());
    }
    search(graph, from, |id| id == to)
}

/// Path to the nearest room (by hops) that still has an unresolved exit.
///
/// The starting room itself is never the answer; `None` means every room reachable from
/// `from` is fully resolved.
pub fn nearest_frontier(graph: &RoomGraph, from: RoomId) -> Option<Path> {
    search(graph, from, |id| {
        graph.room(id).map(|r| r.is_frontier()).unwrap_or(false)
    })
}

/// Every room reachable from `from`, including `from`, in BFS order.
pub fn reachable_rooms(graph: &RoomGraph, from: RoomId) -> Vec<RoomId> {
    if !graph.contains(from) {
        return Vec::new();
    }
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        order.push(current);
        let Some(room) = graph.room(current) else {
            continue;
        };
        for (_, next) in room.resolved() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    order
}

fn search<F>(graph: &RoomGraph, from: RoomId, is_target: F) -> Option<Path>
where
    F: Fn(RoomId) -> bool,
{
    graph.room(from)?;

    let mut came_from: HashMap<RoomId, (RoomId, Direction)> = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        let Some(room) = graph.room(current) else {
            continue;
        };
        for (direction, next) in room.resolved() {
            if !visited.insert(next) {
                continue;
            }
            came_from.insert(next, (current, direction));
            if is_target(next) {
                return Some(unwind(&came_from, from, next));
            }
            queue.push_back(next);
        }
    }

    None
}

fn unwind(came_from: &HashMap<RoomId, (RoomId, Direction)>, from: RoomId, to: RoomId) -> Path {
    let mut path = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let Some(&(prev, direction)) = came_from.get(&cursor) else {
            break;
        };
        path.push(Step::new(cursor, direction));
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::graph::{Room, Terrain};
    use Direction::*;

    fn add(graph: &mut RoomGraph, id: RoomId, exits: &[Direction]) {
        graph.record(Room::observed(id, "room", Terrain::Normal, exits.iter().copied()));
    }

    /// 0 - 1 - 2
    /// |       |
    /// 3 - 4 - 5     6 (isolated)
    fn ring() -> RoomGraph {
        let mut g = RoomGraph::new();
        add(&mut g, 0, &[East, South]);
        add(&mut g, 1, &[West, East]);
        add(&mut g, 2, &[West, South]);
        add(&mut g, 3, &[North, East]);
        add(&mut g, 4, &[West, East]);
        add(&mut g, 5, &[West, North]);
        add(&mut g, 6, &[North]);
        g.link(0, East, 1).unwrap();
        g.link(1, East, 2).unwrap();
        g.link(0, South, 3).unwrap();
        g.link(3, East, 4).unwrap();
        g.link(4, East, 5).unwrap();
        g.link(2, South, 5).unwrap();
        g
    }

    #[test]
    fn same_room_is_empty_path() {
        assert_eq!(find_path(&ring(), 4, 4), Some(vec![]));
    }

    #[test]
    fn shortest_path_ends_at_target() {
        let g = ring();
        let path = find_path(&g, 0, 2).unwrap();
        assert_eq!(path, vec![Step::new(1, East), Step::new(2, East)]);

        let path = find_path(&g, 1, 4).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last().unwrap().room, 4);
    }

    #[test]
    fn path_length_matches_bfs_distance_for_all_pairs() {
        let g = ring();
        // distances on a 6-cycle
        let order = [0, 1, 2, 5, 4, 3];
        for (i, a) in order.iter().enumerate() {
            for (j, b) in order.iter().enumerate() {
                let around = (i as i32 - j as i32).unsigned_abs() as usize;
                let expected = around.min(6 - around);
                let path = find_path(&g, *a, *b).unwrap();
                assert_eq!(path.len(), expected, "{} -> {}", a, b);
            }
        }
    }

    #[test]
    fn repeated_search_is_stable() {
        let g = ring();
        assert_eq!(find_path(&g, 0, 5), find_path(&g, 0, 5));
    }

    #[test]
    fn unreachable_and_unknown_rooms() {
        let g = ring();
        assert_eq!(find_path(&g, 0, 6), None);
        assert_eq!(find_path(&g, 0, 42), None);
        assert_eq!(find_path(&g, 42, 0), None);
    }

    #[test]
    fn path_steps_follow_edges() {
        let g = ring();
        let path = find_path(&g, 3, 2).unwrap();
        let mut at = 3;
        for step in &path {
            let room = g.room(at).unwrap();
            assert_eq!(
                room.neighbor(step.direction),
                crate::modules::graph::Neighbor::Room(step.room)
            );
            at = step.room;
        }
        assert_eq!(at, 2);
    }

    #[test]
    fn frontier_search_finds_nearest_unresolved_room() {
        let mut g = RoomGraph::new();
        add(&mut g, 0, &[East]);
        add(&mut g, 1, &[West, East]);
        add(&mut g, 2, &[West, North]);
        g.link(0, East, 1).unwrap();
        g.link(1, East, 2).unwrap();

        let path = nearest_frontier(&g, 0).unwrap();
        assert_eq!(path, vec![Step::new(1, East), Step::new(2, East)]);
    }

    #[test]
    fn frontier_search_ignores_start_and_reports_completion() {
        let g = ring();
        assert_eq!(nearest_frontier(&g, 0), None);

        let mut g = RoomGraph::new();
        add(&mut g, 0, &[East]);
        assert_eq!(nearest_frontier(&g, 0), None);
    }

    #[test]
    fn reachable_rooms_stay_in_component() {
        let g = ring();
        let mut rooms = reachable_rooms(&g, 0);
        rooms.sort();
        assert_eq!(rooms, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(reachable_rooms(&g, 6), vec![6]);
        assert!(reachable_rooms(&g, 99).is_empty());
    }
}
