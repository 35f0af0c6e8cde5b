extern crate cases;

use cases::cases as scenarios;

#[test]
fn leader_election() {
	cases::init_logger();
	scenarios::leader_election::run();
}

#[test]
fn no_quorum() {
	cases::init_logger();
	scenarios::no_quorum::run();
}

#[test]
fn higher_term() {
	cases::init_logger();
	scenarios::higher_term::run();
}

#[test]
fn failover() {
	cases::init_logger();
	scenarios::failover::run();
}

#[test]
fn suppression() {
	cases::init_logger();
	scenarios::suppression::run();
}
