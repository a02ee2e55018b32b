//! p4 wrapper - intercepts and logs `p4` invocations
//!
//! Install this binary ahead of the real client on PATH (or point the
//! integration at it). Every call is forwarded to the configured executable
//! and recorded in the diagnostic log.

fn main() {
    p4_wrapper_shim::main_exit()
}
