/*
 * Built-in Protocols
 *
 * - FileMustBeClosedProtocol: every allocated File is closed again
 * - PrintStreamProtocol: no use of a PrintStream after close()
 *
 * These protocols are used out-of-the-box without configuration.
 */

use std::collections::BTreeSet;

use crate::features::typestate::domain::{Action, Protocol, SeedRule, State};
use crate::features::typestate::ports::ProtocolDefinition;

/// File must be closed
///
/// States: INIT → OPENED → CLOSED
///
/// Transitions:
/// - INIT   --open()-->  OPENED
/// - INIT   --close()--> CLOSED
/// - OPENED --close()--> CLOSED
/// - CLOSED --open()-->  OPENED
///
/// Error states: {OPENED}
/// Seeds: `new File()`
pub struct FileMustBeClosedProtocol;

impl ProtocolDefinition for FileMustBeClosedProtocol {
    fn define() -> Protocol {
        let mut protocol = Protocol::new("FileMustBeClosed");

        let init = State::new("INIT");
        let opened = State::new("OPENED");
        let closed = State::new("CLOSED");

        protocol.set_initial_state(init.clone());
        protocol.add_error_state(opened.clone());
        protocol.add_final_state(init.clone());
        protocol.add_final_state(closed.clone());
        protocol.set_seed_rule(SeedRule::Allocation {
            class: "File".to_string(),
        });

        protocol.add_transition(init.clone(), Action::new("open"), opened.clone());
        protocol.add_transition(init, Action::new("close"), closed.clone());
        protocol.add_transition(opened.clone(), Action::new("open"), opened.clone());
        protocol.add_transition(opened.clone(), Action::new("close"), closed.clone());
        protocol.add_transition(closed.clone(), Action::new("open"), opened);
        protocol.add_transition(closed.clone(), Action::new("close"), closed);

        protocol
    }
}

/// PrintStream use after close
///
/// Tracking starts at every `close()` call, so the initial state is CLOSED.
///
/// Transitions:
/// - NONE   --close()-->                 CLOSED
/// - CLOSED --close()-->                 CLOSED
/// - CLOSED --print()/println()/...-->   ERROR
///
/// Error states: {ERROR}
/// Seeds: receivers of `close()`
pub struct PrintStreamProtocol;

impl PrintStreamProtocol {
    /// Methods that use the stream
    pub const READ_METHODS: &'static [&'static str] = &[
        "append",
        "checkError",
        "flush",
        "format",
        "print",
        "printf",
        "println",
        "write",
    ];
}

impl ProtocolDefinition for PrintStreamProtocol {
    fn define() -> Protocol {
        let mut protocol = Protocol::new("PrintStream");

        let none = State::new("NONE");
        let closed = State::new("CLOSED");
        let error = State::new("ERROR");

        protocol.add_state(none.clone());
        protocol.set_initial_state(closed.clone());
        protocol.add_error_state(error.clone());
        protocol.add_final_state(none.clone());
        protocol.add_final_state(closed.clone());
        protocol.set_seed_rule(SeedRule::ReceiverOfCall {
            actions: BTreeSet::from([Action::new("close")]),
        });

        protocol.add_transitions(&none, &["close"], &closed);
        protocol.add_transitions(&closed, &["close"], &closed);
        protocol.add_transitions(&closed, Self::READ_METHODS, &error);

        protocol
    }
}
