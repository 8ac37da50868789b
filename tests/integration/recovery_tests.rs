//! Line loss, host-requested reset and reboot with a persisted identity.

use embedded_hal::digital::PinState;
use gridnode::app::events::AppEvent;
use gridnode::app::master_service::MasterState;
use gridnode::fsm::StateId;
use gridnode::identity::IdentityStore;
use gridnode::pins;
use gridnode::protocol::{ComponentKind, Data, Direction, HostCommand, HostLine, NodeType, Position};

use crate::discovery_tests::{DISCOVERY_BUDGET, discovered};
use crate::mock_hw::SimGrid;

fn chain() -> SimGrid {
    let mut grid = SimGrid::new(&[
        (Position::new(1, 0), NodeType::Potentiometer),
        (Position::new(2, 0), NodeType::Button),
    ]);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);
    grid
}

fn disconnects(grid: &SimGrid) -> Vec<(u8, Direction)> {
    grid.host_lines()
        .into_iter()
        .filter_map(|line| match line {
            HostLine::Disconnected { node_id, dir } => Some((node_id, dir)),
            _ => None,
        })
        .collect()
}

#[test]
fn lost_parent_reported_once() {
    let mut grid = chain();
    grid.send_host(HostCommand::Start);
    grid.run(10);
    grid.clear_host_output();

    grid.unplug(SimGrid::board_of(0));
    grid.run(50);

    assert_eq!(disconnects(&grid), vec![(2, Direction::Left)]);
    assert!(grid.master_events.events.contains(&AppEvent::NodeDisconnected {
        node_id: 2,
        dir: Direction::Left,
    }));
    let lost = grid.nodes[1]
        .events
        .events
        .iter()
        .filter(|e| **e == AppEvent::LineLost(Direction::Left))
        .count();
    assert_eq!(lost, 1);
}

#[test]
fn lost_parent_not_reported_again_after_restart() {
    let mut grid = chain();
    grid.send_host(HostCommand::Start);
    grid.run(10);
    grid.clear_host_output();

    grid.unplug(SimGrid::board_of(0));
    grid.run(20);
    grid.send_host(HostCommand::Quit);
    grid.run(5);
    grid.send_host(HostCommand::Start);
    grid.run(20);

    assert_eq!(grid.nodes[1].service.state(), StateId::Streaming);
    assert_eq!(disconnects(&grid), vec![(2, Direction::Left)]);
    let saved = IdentityStore::load(&grid.nodes[1].store).expect("identity kept");
    assert!(!saved.watch_set().contains(Direction::Left));
}

#[test]
fn no_disconnect_while_only_configured() {
    let mut grid = chain();
    grid.clear_host_output();
    grid.unplug(SimGrid::board_of(0));
    grid.run(50);
    assert!(disconnects(&grid).is_empty());
}

#[test]
fn reset_rediscovers_the_grid() {
    let mut grid = chain();
    grid.send_host(HostCommand::Start);
    grid.run(10);
    grid.clear_host_output();

    grid.send_host(HostCommand::Reset);
    grid.step();
    assert_eq!(grid.master.state(), MasterState::Discovering);
    assert!(grid.master_events.events.contains(&AppEvent::ResetRequested));
    for node in &grid.nodes {
        assert_eq!(node.service.state(), StateId::Uninitialized);
        assert!(node.events.events.contains(&AppEvent::IdentityCleared));
    }

    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.run(5);
    assert_eq!(grid.host_lines().last(), Some(&HostLine::CsCompleted { count: 2 }));
    assert_eq!(grid.nodes[0].service.node_id(), Some(1));
    assert_eq!(grid.nodes[1].service.node_id(), Some(2));
    assert!(grid.nodes.iter().all(|n| n.service.state() == StateId::Configured));
}

#[test]
fn reboot_resumes_without_rediscovery() {
    let mut grid = chain();
    grid.clear_host_output();

    grid.power_cycle();
    assert_eq!(grid.master.state(), MasterState::Ready);
    assert_eq!(grid.nodes[0].service.state(), StateId::Configured);
    assert_eq!(grid.nodes[1].service.node_id(), Some(2));

    grid.send_host(HostCommand::Start);
    grid.run(10);
    grid.set_input(SimGrid::board_of(1), pins::BUTTON_GPIOS[0], PinState::Low);
    grid.run(10);

    // No fresh discovery and no spurious line loss after the reboot.
    assert_eq!(
        grid.host_lines(),
        vec![HostLine::Value(Data {
            node_id: 2,
            id: 0,
            kind: ComponentKind::Button,
            value: 1.0,
        })]
    );
}
