use rstest::fixture;

#[fixture]
pub fn tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("warn".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

#[fixture]
pub fn debug_tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("rendition_abr=debug".parse().expect("valid directive"))
                .add_directive("rendition_session=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
