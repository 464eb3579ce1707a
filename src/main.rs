fn main() -> anyhow::Result<()> {
    thesis_site_lib::run()
}
