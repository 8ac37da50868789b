//! Grid discovery end to end: master traversal, node id adoption, host
//! reports and the line wiring left in place afterwards.

use gridnode::app::events::AppEvent;
use gridnode::app::master_service::MasterState;
use gridnode::fsm::StateId;
use gridnode::fsm::context::PinPlan;
use gridnode::protocol::{Direction, DirectionSet, HostCommand, HostLine, NodeType, Position};

use crate::mock_hw::SimGrid;

/// Plenty for every probe in these layouts to time out at least once.
pub const DISCOVERY_BUDGET: usize = 4_000;

pub fn discovered(grid: &SimGrid) -> bool {
    grid.master.state() == MasterState::Ready
}

fn node_infos(grid: &SimGrid) -> Vec<(u8, NodeType, Position)> {
    grid.host_lines()
        .into_iter()
        .filter_map(|line| match line {
            HostLine::NodeInfo {
                id,
                node_type,
                position,
            } => Some((id, node_type, position)),
            _ => None,
        })
        .collect()
}

fn dirs(list: &[Direction]) -> DirectionSet {
    list.iter().copied().collect()
}

#[test]
fn lone_master_reports_itself_and_no_nodes() {
    let mut grid = SimGrid::new(&[]);
    assert_eq!(grid.master.state(), MasterState::Discovering);

    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    assert_eq!(
        grid.host_lines(),
        vec![
            HostLine::NodeInfo {
                id: 0,
                node_type: NodeType::MasterPanel,
                position: Position::ORIGIN,
            },
            HostLine::CsCompleted { count: 0 },
        ]
    );
    assert!(grid.master_events.events.contains(&AppEvent::DiscoveryComplete { nodes: 0 }));
}

#[test]
fn two_node_chain_gets_sequential_ids_and_positions() {
    let mut grid = SimGrid::new(&[
        (Position::new(1, 0), NodeType::Potentiometer),
        (Position::new(2, 0), NodeType::Button),
    ]);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);

    assert_eq!(
        node_infos(&grid),
        vec![
            (0, NodeType::MasterPanel, Position::ORIGIN),
            (1, NodeType::Potentiometer, Position::new(1, 0)),
            (2, NodeType::Button, Position::new(2, 0)),
        ]
    );
    assert_eq!(grid.host_lines().last(), Some(&HostLine::CsCompleted { count: 2 }));
    assert_eq!(grid.master.node_count(), 2);

    for (n, id) in [(0, 1), (1, 2)] {
        let node = &grid.nodes[n].service;
        assert_eq!(node.node_id(), Some(id));
        assert_eq!(node.state(), StateId::Configured);
        assert!(grid.nodes[n].events.events.contains(&AppEvent::IdentitySaved));
    }
    assert_eq!(grid.nodes[0].service.components().len(), 1);
}

#[test]
fn completion_wires_watch_and_hold_lines() {
    let mut grid = SimGrid::new(&[
        (Position::new(1, 0), NodeType::Potentiometer),
        (Position::new(2, 0), NodeType::Button),
    ]);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);

    assert_eq!(
        grid.nodes[0].service.pin_plan(),
        PinPlan::Watch {
            watch: dirs(&[Direction::Left]),
            hold: dirs(&[Direction::Right]),
        }
    );
    assert_eq!(
        grid.nodes[1].service.pin_plan(),
        PinPlan::Watch {
            watch: dirs(&[Direction::Left]),
            hold: DirectionSet::EMPTY,
        }
    );

    // The master holds the line to its only child; nothing else is low.
    assert!(grid.world.line_low(0, Direction::Right));
    assert!(!grid.world.line_low(0, Direction::Top));
    assert!(grid.world.line_low(SimGrid::board_of(1), Direction::Left));
    assert!(!grid.world.line_low(SimGrid::board_of(1), Direction::Right));
}

#[test]
fn branching_layout_reports_every_cell() {
    let layout = [
        (Position::new(1, 0), NodeType::Potentiometer),
        (Position::new(1, 1), NodeType::Button),
        (Position::new(0, -1), NodeType::RotaryEncoder),
        (Position::new(-1, -1), NodeType::DualRotary),
    ];
    let mut grid = SimGrid::new(&layout);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);

    let infos = node_infos(&grid);
    assert_eq!(infos.len(), layout.len() + 1);

    let mut ids: Vec<u8> = Vec::new();
    for (n, &(position, node_type)) in layout.iter().enumerate() {
        let id = grid.nodes[n].service.node_id().expect("every node discovered");
        assert!(infos.contains(&(id, node_type, position)), "node {id} at {position:?}");
        assert_eq!(grid.nodes[n].service.state(), StateId::Configured);
        ids.push(id);
    }
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(grid.host_lines().last(), Some(&HostLine::CsCompleted { count: 4 }));
}

#[test]
fn unreachable_board_stays_uninitialized() {
    let mut grid = SimGrid::new(&[
        (Position::new(1, 0), NodeType::Button),
        (Position::new(3, 3), NodeType::Button),
    ]);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);

    assert_eq!(grid.host_lines().last(), Some(&HostLine::CsCompleted { count: 1 }));
    assert_eq!(grid.nodes[1].service.node_id(), None);
    assert_eq!(grid.nodes[1].service.state(), StateId::Uninitialized);
}

#[test]
fn start_during_discovery_is_ignored() {
    let mut grid = SimGrid::new(&[(Position::new(1, 0), NodeType::Button)]);
    grid.send_host(HostCommand::Start);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);

    assert_eq!(grid.master.state(), MasterState::Ready);
    assert_eq!(grid.nodes[0].service.state(), StateId::Configured);
}
