fn main() {
    treefold::start_cli();
}
