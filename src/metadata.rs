// Generated by build.rs from the [package] table.
include!(concat!(env!("OUT_DIR"), "/pkg_info.rs"));
