//! Property and fuzz-style tests for robustness of the wire formats.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use gridnode::adapters::nvs::NvsAdapter;
use gridnode::identity::{IdentityStore, PersistedIdentity};
use gridnode::protocol::{
    BoundsData, CommandTable, ComponentKind, Crc8, Data, Direction, DirectionSet, Downstream,
    HostCommand, HostLine, NodeType, UpstreamFrame, decode_line,
};
use gridnode::transport::{FrameDecoder, encode_frame};
use proptest::prelude::*;

fn crc() -> Crc8 {
    Crc8::new(0x07)
}

fn direction() -> impl Strategy<Value = Direction> {
    (0usize..4).prop_map(|i| Direction::ALL[i])
}

fn kind() -> impl Strategy<Value = ComponentKind> {
    prop_oneof![
        Just(ComponentKind::Button),
        Just(ComponentKind::Potentiometer),
        Just(ComponentKind::RotaryEncoder),
    ]
}

fn downstream() -> impl Strategy<Value = Downstream> {
    prop_oneof![
        any::<u8>().prop_map(Downstream::AssignId),
        proptest::option::of(direction()).prop_map(Downstream::DirInstruction),
        Just(Downstream::CsCompleted),
        (0u8..16, 0u8..16).prop_map(|(w, h)| Downstream::DirToCheck {
            watch: DirectionSet::from_bits(w),
            hold: DirectionSet::from_bits(h),
        }),
        (0u8..6).prop_map(|t| Downstream::Configure(NodeType::from_wire(t))),
        (kind(), any::<u8>(), -1e4f32..1e4, -1e4f32..1e4, 0.0f32..100.0).prop_map(
            |(kind, component_id, min, max, step)| Downstream::Bounds(BoundsData {
                kind,
                component_id,
                min,
                max,
                step,
            })
        ),
        Just(Downstream::Start),
        Just(Downstream::Quit),
        Just(Downstream::Reset),
    ]
}

fn host_line() -> impl Strategy<Value = HostLine> {
    prop_oneof![
        (any::<u8>(), 0u8..6, any::<i8>(), any::<i8>()).prop_map(|(id, t, x, y)| HostLine::NodeInfo {
            id,
            node_type: NodeType::from_wire(t),
            position: gridnode::protocol::Position::new(x, y),
        }),
        any::<u8>().prop_map(|count| HostLine::CsCompleted { count }),
        (any::<u8>(), kind(), any::<u8>(), -1e6f32..1e6).prop_map(|(node_id, kind, id, value)| {
            HostLine::Value(Data {
                node_id,
                id,
                kind,
                value,
            })
        }),
        (any::<u8>(), direction()).prop_map(|(node_id, dir)| HostLine::Disconnected { node_id, dir }),
    ]
}

// ── Decoders never panic ──────────────────────────────────────

proptest! {
    #[test]
    fn packet_decoders_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..40)) {
        let table = CommandTable::default();
        let _ = Downstream::decode(&table, &bytes);
        let _ = UpstreamFrame::decode(&table, &bytes);
    }

    #[test]
    fn host_decoders_never_panic(line in "\\PC{0,64}") {
        let table = CommandTable::default();
        let _ = decode_line(&table, &crc(), &line);
        let _ = HostCommand::decode(&table, &crc(), &line);
    }
}

// ── Wire formats ──────────────────────────────────────────────

proptest! {
    /// Every packet the master can emit reads back as itself on the node.
    #[test]
    fn downstream_packets_read_back(packet in downstream()) {
        let table = CommandTable::default();
        let bytes = packet.encode(&table);
        prop_assert_eq!(Downstream::decode(&table, &bytes), Ok(packet));
    }

    /// CRC-8 catches every single-bit error in the body of a host line.
    #[test]
    fn single_bit_error_in_host_line_rejected(
        line in host_line(),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let table = CommandTable::default();
        let text = line.encode(&table, &crc());
        let body_len = text.rfind(' ').unwrap_or(0);
        prop_assume!(body_len > 0);

        let mut bytes = text.into_bytes();
        bytes[pick.index(body_len)] ^= 1 << bit;
        let corrupted = String::from_utf8(bytes).expect("ASCII stays ASCII");
        prop_assert!(decode_line(&table, &crc(), &corrupted).is_err());
    }

    /// Back-to-back bus frames come out of the decoder intact and in order.
    #[test]
    fn frame_stream_decodes_in_order(
        frames in proptest::collection::vec(
            (any::<u8>(), any::<u8>(), proptest::collection::vec(any::<u8>(), 1..=32)),
            1..8,
        ),
    ) {
        let mut wire = Vec::new();
        for (sender, dest, payload) in &frames {
            wire.extend_from_slice(&encode_frame(&crc(), *sender, *dest, payload).expect("fits"));
        }
        let mut decoder = FrameDecoder::new(crc());
        let decoded: Vec<_> = wire.iter().filter_map(|b| decoder.push(*b)).collect();

        prop_assert_eq!(decoded.len(), frames.len());
        for (got, (sender, dest, payload)) in decoded.iter().zip(&frames) {
            prop_assert_eq!((got.sender, got.dest), (*sender, *dest));
            prop_assert_eq!(got.bytes.as_slice(), payload.as_slice());
        }
        prop_assert_eq!(decoder.rejected(), 0);
    }
}

// ── Persistence ───────────────────────────────────────────────

proptest! {
    #[test]
    fn identity_survives_storage(
        node_id in 1u8..16,
        t in 0u8..6,
        watch in 0u8..16,
        hold in 0u8..16,
    ) {
        let mut nvs = NvsAdapter::new().expect("in-memory NVS");
        let ident = PersistedIdentity::node(
            node_id,
            NodeType::from_wire(t),
            DirectionSet::from_bits(watch),
            DirectionSet::from_bits(hold),
        );
        IdentityStore::save(&mut nvs, &ident).expect("save");
        prop_assert_eq!(IdentityStore::load(&nvs), Some(ident));

        IdentityStore::clear(&mut nvs).expect("clear");
        prop_assert_eq!(IdentityStore::load(&nvs), None);
    }
}
