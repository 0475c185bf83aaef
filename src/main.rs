use retro_desk::SceneConfig;

fn main() -> anyhow::Result<()> {
    retro_desk::run(SceneConfig::from_env())
}
