//! `p4` stand-in: forwards to the real client and logs the invocation.

fn main() {
    p4_wrapper_shim::main_exit()
}
