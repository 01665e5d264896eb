fn main() -> anyhow::Result<()> {
    calculator_scene::flow::run()
}
