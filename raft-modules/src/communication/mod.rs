pub mod inproc_member;
