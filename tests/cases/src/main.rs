extern crate cases;

use cases::cases as scenarios;

fn main() {
	cases::init_logger();

	scenarios::leader_election::run();
	scenarios::no_quorum::run();
	scenarios::higher_term::run();
	scenarios::failover::run();
	scenarios::suppression::run();
}
