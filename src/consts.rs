// formats
pub const TAGALIGN_GZ: &str = "tagAlign.gz";
pub const REGION_PEAK_GZ: &str = "regionPeak.gz";
pub const GZ: &str = "gz";

// config keys | global
pub const TARGET_READ_FILES: &str = "target_read_files";
pub const CONTROL_READ_FILES: &str = "control_read_files";
pub const NUM_THREADS: &str = "num_threads";
pub const TEMP_DIR: &str = "temp_dir";
pub const FINAL_PEAKS: &str = "final_peaks";
pub const BOWTIE_BIN: &str = "bowtie_bin";
pub const SAMTOOLS_BIN: &str = "samtools_bin";
pub const BEDTOOLS_BIN: &str = "bedtools_bin";
pub const BOWTIE_INDEX: &str = "bowtie_index";
pub const CHIPSEQ_RSCRIPT: &str = "chipseq_rscript";
pub const SPP_SCRIPT: &str = "spp_script";
pub const SPP_TGZ: &str = "spp_tgz";
pub const IDR_SCRIPT: &str = "idr_script";
pub const IDR_SCRIPT_DIR: &str = "idr_script_dir";
pub const RLIB_DIR: &str = "rlib_dir";
pub const GENOME_TABLE: &str = "genome_table";
pub const IDR_THRESHOLD: &str = "idr_threshold";

// config keys | steps
pub const NPEAK: &str = "npeak";
pub const PEAK_TYPE: &str = "peak-type";
pub const EXCLUSION_ZONE: &str = "exclusion-zone";

// project-wide names
pub const CHIPPIPE: &str = "chippipe";
pub const RSCRIPT: &str = "Rscript";
pub const POOLED_REP: &str = "Rep0";
pub const PEAK_VS: &str = "_VS_";
pub const IDR_FILE_PREFIX: &str = "idr_";
pub const OVERLAPPED_PEAKS_SUFFIX: &str = "-overlapped-peaks.txt";
pub const PHANTOM_SUFFIX: &str = "_phantom.tab";
pub const ENCODING_SUFFIX: &str = "_fastq_encoding.txt";
pub const SPP_TMP_INFIX: &str = "_spp_";
pub const GUESS_ENCODING: &str = "guessFqEncoding";
pub const CHECK_INSTALL_SPP: &str = "checkInstallSpp";

// fixed tool parameters
pub const SAM_FILTER_FLAG: u32 = 1548;
pub const STRAND_PLACEHOLDER: &str = "N";
pub const BOWTIE_RESERVED_THREADS: i64 = 4;
pub const DEFAULT_IDR_THRESHOLD: f64 = 0.01;

// report layout, zero-based columns
pub const IDR_SCORE_COLUMN: usize = 10;
pub const SIGNAL_COLUMN: usize = 6;
pub const PVALUE_COLUMN: usize = 7;

// collections
pub const REQUIRED_GLOBALS: &[&str] = &[
    TARGET_READ_FILES,
    CONTROL_READ_FILES,
    TEMP_DIR,
    FINAL_PEAKS,
    BOWTIE_BIN,
    SAMTOOLS_BIN,
    BEDTOOLS_BIN,
    BOWTIE_INDEX,
    CHIPSEQ_RSCRIPT,
    SPP_SCRIPT,
    SPP_TGZ,
    IDR_SCRIPT,
    IDR_SCRIPT_DIR,
    RLIB_DIR,
    GENOME_TABLE,
];
