/// One logical input change delivered to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The drawing source was edited.
    SourceChanged(String),
    WidthChanged(u32),
    HeightChanged(u32),
    /// Both dimensions at once.
    SizeChanged { width: u32, height: u32 },
    /// Index into the controller's surface configurations.
    ConfigurationChanged(usize),
}
