use gumdrop::Options;

#[derive(Debug, Default, Options)]
pub struct CliStart {
    #[options(help_flag, help = "print help message")]
    pub help: bool,
    #[options(help = "show program version number")]
    pub version: bool,
    #[options(no_short, help = "show debug output")]
    pub verbose: bool,
    #[options(meta = "PATH", help = "where to write the scaled 43x42 bitmap")]
    pub temp_file: Option<String>,
    #[options(help = "do not write the scaled bitmap")]
    pub no_temp_file: bool,
    #[options(meta = "PATH", help = "RON file with an alternative LED layout")]
    pub layout: Option<String>,
    #[options(meta = "PATH", help = "write the active LED layout as RON and exit")]
    pub dump_layout: Option<String>,
    #[options(free, help = "<bmp image name (input)> <csv file (output)>")]
    pub files: Vec<String>,
}

impl CliStart {
    /// The input and output paths, if exactly two were given
    pub fn input_output(&self) -> Option<(&str, &str)> {
        match self.files.as_slice() {
            [input, output] => Some((input.as_str(), output.as_str())),
            _ => None,
        }
    }
}
