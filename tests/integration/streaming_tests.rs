//! Streaming: start/quit broadcasts, component change relay and bounds
//! forwarding through the master.

use embedded_hal::digital::PinState;
use gridnode::app::master_service::MasterState;
use gridnode::config::NodeConfig;
use gridnode::fsm::StateId;
use gridnode::pins;
use gridnode::protocol::{BoundsData, ComponentKind, Crc8, Data, HostCommand, HostLine, NodeType, Position};

use crate::discovery_tests::{DISCOVERY_BUDGET, discovered};
use crate::mock_hw::SimGrid;

/// Master, a potentiometer at (1,0) and a button at (2,0), discovered and
/// streaming, with the host output cleared.
fn streaming_chain() -> SimGrid {
    let mut grid = SimGrid::new(&[
        (Position::new(1, 0), NodeType::Potentiometer),
        (Position::new(2, 0), NodeType::Button),
    ]);
    grid.set_analog(SimGrid::board_of(0), pins::POT_ADC_GPIO, 100);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.send_host(HostCommand::Start);
    grid.run(10);
    grid.clear_host_output();
    grid
}

fn values(grid: &SimGrid) -> Vec<Data> {
    grid.host_lines()
        .into_iter()
        .filter_map(|line| match line {
            HostLine::Value(data) => Some(data),
            _ => None,
        })
        .collect()
}

#[test]
fn start_puts_every_node_in_streaming() {
    let grid = streaming_chain();
    assert_eq!(grid.master.state(), MasterState::Streaming);
    for node in &grid.nodes {
        assert_eq!(node.service.state(), StateId::Streaming);
    }
    // Nothing changed yet, so nothing reported.
    assert!(grid.host_lines().is_empty());
}

#[test]
fn potentiometer_change_is_relayed_to_host() {
    let mut grid = streaming_chain();
    grid.set_analog(SimGrid::board_of(0), pins::POT_ADC_GPIO, 900);
    grid.run(40);

    let reports = values(&grid);
    assert!(!reports.is_empty());
    for data in &reports {
        assert_eq!((data.node_id, data.id, data.kind), (1, 0, ComponentKind::Potentiometer));
    }
    let last = reports.last().map(|d| d.value).unwrap_or_default();
    assert!(last > 800.0 && last <= 900.0, "settled near the new reading, got {last}");
}

#[test]
fn button_press_and_release_relayed_once_each() {
    let mut grid = streaming_chain();
    let board = SimGrid::board_of(1);
    let pin = pins::BUTTON_GPIOS[0];

    grid.set_input(board, pin, PinState::Low);
    grid.run(10);
    grid.set_input(board, pin, PinState::High);
    grid.run(10);

    let expected = |value| Data {
        node_id: 2,
        id: 0,
        kind: ComponentKind::Button,
        value,
    };
    assert_eq!(values(&grid), vec![expected(1.0), expected(0.0)]);
}

#[test]
fn master_panel_reports_under_master_id() {
    let mut grid = streaming_chain();
    grid.set_input(0, pins::BUTTON_GPIOS[1], PinState::Low);
    grid.run(3);

    assert_eq!(
        values(&grid),
        vec![Data {
            node_id: 0,
            id: 2,
            kind: ComponentKind::Button,
            value: 1.0,
        }]
    );
}

#[test]
fn bounds_are_forwarded_and_rescale_values() {
    let mut grid = streaming_chain();
    grid.send_host(HostCommand::Bounds {
        node_id: 1,
        bounds: BoundsData {
            kind: ComponentKind::Potentiometer,
            component_id: 0,
            min: 0.0,
            max: 10.0,
            step: 1.0,
        },
    });
    grid.run(2);
    grid.set_analog(SimGrid::board_of(0), pins::POT_ADC_GPIO, 1023);
    grid.run(60);

    let reports = values(&grid);
    assert!(!reports.is_empty());
    assert!(reports.iter().all(|d| d.value >= 0.0 && d.value <= 10.0));
}

#[test]
fn non_finite_bounds_lines_are_dropped() {
    let mut grid = streaming_chain();
    let crc = Crc8::new(NodeConfig::default().crc_polynomial);
    for body in ["B 0:R:0:NaN:5:1", "B 0:R:0:0:inf:1", "B 1:P:0:-inf:5:1"] {
        grid.send_host_raw(&format!("{body} {}\r\n", crc.compute(body.as_bytes())));
    }
    grid.run(5);
    assert_eq!(grid.master.state(), MasterState::Streaming);

    grid.set_analog(SimGrid::board_of(0), pins::POT_ADC_GPIO, 900);
    grid.run(40);
    let last = values(&grid).last().map(|d| d.value).unwrap_or_default();
    assert!(last > 800.0 && last <= 900.0, "bounds left unscaled, got {last}");
}

#[test]
fn quit_stops_reporting() {
    let mut grid = streaming_chain();
    grid.send_host(HostCommand::Quit);
    grid.run(3);
    assert_eq!(grid.master.state(), MasterState::Ready);
    assert!(grid.nodes.iter().all(|n| n.service.state() == StateId::Configured));

    grid.set_input(SimGrid::board_of(1), pins::BUTTON_GPIOS[0], PinState::Low);
    grid.set_analog(SimGrid::board_of(0), pins::POT_ADC_GPIO, 900);
    grid.run(20);
    assert!(values(&grid).is_empty());
}

#[test]
fn corrupted_host_line_is_dropped() {
    let mut grid = SimGrid::new(&[(Position::new(1, 0), NodeType::Button)]);
    assert!(grid.run_until(DISCOVERY_BUDGET, discovered));
    grid.send_host_raw("S 0x\r\n");
    grid.run(5);
    assert_eq!(grid.master.state(), MasterState::Ready);
    assert_eq!(grid.nodes[0].service.state(), StateId::Configured);
}
