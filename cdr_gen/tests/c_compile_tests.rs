/* Compile-and-run tests
 *
 * Each test writes a generated header and a small driver program into a
 * temporary directory, builds it with the system compiler under -Werror and
 * runs it. The driver encodes known values, checks the wire bytes, decodes
 * them back and exercises the failure paths. Tests are skipped when no
 * compiler is installed.
 */

mod common;

use anyhow::{bail, Context, Result};
use cdr_gen::{CodeGenerator, CodeGeneratorOptions, TargetLanguage};
use std::fs;
use std::path::Path;
use std::process::Command;

fn compiler_available(compiler: &str) -> bool {
    Command::new(compiler)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn build_and_run(compiler: &str, std: &str, dir: &Path, source: &str) -> Result<()> {
    let binary = dir.join("driver");
    let output = Command::new(compiler)
        .arg(format!("-std={}", std))
        .arg("-Wall")
        .arg("-Werror")
        .arg(format!("-I{}", dir.display()))
        .arg(dir.join(source))
        .arg("-o")
        .arg(&binary)
        .arg("-lm")
        .output()
        .with_context(|| format!("failed to run {}", compiler))?;
    if !output.status.success() {
        bail!("{} compilation failed:\n{}", compiler, String::from_utf8_lossy(&output.stderr));
    }

    let run = Command::new(&binary).output().context("failed to run driver")?;
    if !run.status.success() {
        bail!(
            "driver failed:\n{}{}",
            String::from_utf8_lossy(&run.stdout),
            String::from_utf8_lossy(&run.stderr)
        );
    }
    Ok(())
}

fn generate(language: TargetLanguage) -> Result<String> {
    let model = common::model()?;
    let options = CodeGeneratorOptions {
        language,
        include_guard: Some("MODEL_H".to_string()),
        ..CodeGeneratorOptions::default()
    };
    let header = CodeGenerator::new(&model.arena, options).emit(&model.roots())?;
    Ok(header)
}

const C_DRIVER: &str = r#"#include <stdio.h>
#include "model.h"

#define CHECK(cond) do { if (!(cond)) { \
  fprintf(stderr, "check failed: %s (line %d)\n", #cond, __LINE__); return 1; } } while (0)

int main(void) {
  /* packed point: 8 wire bytes, big-endian */
  geo_Point_t p = {5, -3};
  geo_Point_wire_t pw;
  encode_geo_Point(&p, &pw);
  const unsigned char point_bytes[8] = {0, 0, 0, 5, 0xff, 0xff, 0xff, 0xfd};
  CHECK(sizeof(pw) == 8);
  CHECK(memcmp(&pw, point_bytes, 8) == 0);
  geo_Point_t p2;
  CHECK(decode_geo_Point(&pw, &p2) == 0);
  CHECK(p2.x == 5 && p2.y == -3);

  /* int32 vals[4]: four consecutive words */
  Samples_t s = {{1, 2, 3, 4}};
  Samples_wire_t sw;
  encode_Samples(&s, &sw);
  const unsigned char sample_bytes[16] = {0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4};
  CHECK(sizeof(sw) == 16);
  CHECK(memcmp(&sw, sample_bytes, 16) == 0);

  /* unknown discriminant without a default member */
  MsgStrict_t strict;
  memset(&strict, 0, sizeof(strict));
  strict.tag = 99;
  MsgStrict_wire_t strict_wire;
  encode_MsgStrict(&strict, &strict_wire);
  MsgStrict_t untouched;
  memset(&untouched, 0x5a, sizeof(untouched));
  CHECK(decode_MsgStrict(&strict_wire, &untouched) == -1);
  CHECK(((unsigned char*)&untouched)[0] == 0x5a);

  /* ... and with one */
  Msg_t msg;
  memset(&msg, 0, sizeof(msg));
  msg.tag = 99;
  msg.data.other = 7;
  Msg_wire_t msg_wire;
  encode_Msg(&msg, &msg_wire);
  Msg_t msg2;
  CHECK(decode_Msg(&msg_wire, &msg2) == 0);
  CHECK(msg2.tag == 99 && msg2.data.other == 7);

  /* packed frame with nested aggregates at unaligned offsets */
  Frame_t f;
  memset(&f, 0, sizeof(f));
  f.kind = 3;
  f.at.x = 1;
  f.at.y = 2;
  f.msg.tag = 2;
  f.msg.data.other = -8;
  Frame_wire_t fw;
  encode_Frame(&f, &fw);
  const unsigned char frame_bytes[17] = {3, 0, 0, 0, 1, 0, 0, 0, 2,
                                        0, 0, 0, 2, 0xff, 0xff, 0xff, 0xf8};
  CHECK(sizeof(fw) == 17);
  CHECK(memcmp(&fw, frame_bytes, 17) == 0);
  Frame_t f2;
  CHECK(decode_Frame(&fw, &f2) == 0);
  CHECK(f2.kind == 3 && f2.at.x == 1 && f2.at.y == 2 && f2.msg.tag == 2 && f2.msg.data.other == -8);

  /* byte-exact struct */
  CHECK(sizeof(Tag_wire_t) == 5);

  /* packed union: tag then the widest member, no padding */
  Packet_t pk;
  memset(&pk, 0, sizeof(pk));
  pk.tag = 2;
  pk.data.b = 1.0;
  Packet_wire_t pkw;
  encode_Packet(&pk, &pkw);
  const unsigned char packet_bytes[10] = {0, 2, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0};
  CHECK(sizeof(pkw) == 10);
  CHECK(memcmp(&pkw, packet_bytes, 10) == 0);
  Packet_t pk2;
  CHECK(decode_Packet(&pkw, &pk2) == 0);
  CHECK(pk2.tag == 2 && pk2.data.b == 1.0);

  /* enum and boolean discriminants */
  Choice_t c;
  memset(&c, 0, sizeof(c));
  c.tag = GEO_COLOR_BLUE;
  c.data.gb = 2.5;
  Choice_wire_t cw;
  encode_Choice(&c, &cw);
  Choice_t c2;
  CHECK(decode_Choice(&cw, &c2) == 0);
  CHECK(c2.tag == GEO_COLOR_BLUE && c2.data.gb == 2.5);
  cw.tag[3] = 9;
  CHECK(decode_Choice(&cw, &c2) == -1);

  Flag_t flag;
  memset(&flag, 0, sizeof(flag));
  flag.tag = true;
  flag.data.on = 1.5f;
  Flag_wire_t flag_wire;
  encode_Flag(&flag, &flag_wire);
  Flag_t flag2;
  CHECK(decode_Flag(&flag_wire, &flag2) == 0);
  CHECK(flag2.tag && flag2.data.on == 1.5f);
  flag_wire.tag[0] = 0;
  CHECK(decode_Flag(&flag_wire, &flag2) == -1);

  /* every leaf kind, hooks included */
  Telemetry_t t;
  memset(&t, 0, sizeof(t));
  t.color = GEO_COLOR_GREEN;
  t.origin.x = 10;
  t.origin.y = -20;
  t.msg.tag = 1;
  t.msg.data.ping = 42;
  strcpy(t.name, "probe");
  t.readings.length = 3;
  t.readings.data[0] = -1;
  t.readings.data[1] = 0;
  t.readings.data[2] = 99;
  t.level = 0.5;
  t.gain = 2.6f;
  t.raw[1][2] = 9;
  t.ok = true;
  t.strict.tag = 2;
  t.strict.data.other = 5;

  CHECK(validate_Telemetry(&t) == 0);
  transform_Telemetry(&t);
  CHECK(t.gain == 3.0f);

  Telemetry_wire_t tw;
  encode_Telemetry(&t, &tw);
  Telemetry_t t2;
  memset(&t2, 0, sizeof(t2));
  CHECK(decode_Telemetry(&tw, &t2) == 0);
  CHECK(t2.color == GEO_COLOR_GREEN);
  CHECK(t2.origin.x == 10 && t2.origin.y == -20);
  CHECK(t2.msg.tag == 1 && t2.msg.data.ping == 42);
  CHECK(strcmp(t2.name, "probe") == 0);
  CHECK(t2.readings.length == 3 && t2.readings.data[2] == 99);
  CHECK(t2.level == 0.5 && t2.gain == 3.0f);
  CHECK(t2.raw[1][2] == 9 && t2.ok);
  CHECK(t2.strict.tag == 2 && t2.strict.data.other == 5);

  t.level = 1.5;
  CHECK(validate_Telemetry(&t) == -1);
  t.level = 0.5;
  t.readings.data[1] = -101;
  CHECK(validate_Telemetry(&t) == -1);
  t.readings.data[1] = 0;
  CHECK(validate_Telemetry(&t) == 0);

  Telemetry_wire_t bad;
  memcpy(&bad, &tw, sizeof(bad));
  bad.ok[0] = 2;
  CHECK(decode_Telemetry(&bad, &t2) == -1);
  memcpy(&bad, &tw, sizeof(bad));
  bad.color[3] = 3;
  CHECK(decode_Telemetry(&bad, &t2) == -1);
  memcpy(&bad, &tw, sizeof(bad));
  bad.readings.length[3] = 5;
  CHECK(decode_Telemetry(&bad, &t2) == -1);
  memcpy(&bad, &tw, sizeof(bad));
  memset(bad.name, 'x', sizeof(bad.name));
  CHECK(decode_Telemetry(&bad, &t2) == -1);

  return 0;
}
"#;

const CPP_DRIVER: &str = r#"#include <cstdio>
#include "model.hpp"

#define CHECK(cond) do { if (!(cond)) { \
  std::fprintf(stderr, "check failed: %s (line %d)\n", #cond, __LINE__); return 1; } } while (0)

int main() {
  ::geo::Point p{};
  p.x = 5;
  p.y = -3;
  std::vector<char> buffer = cdr::Serialization<::geo::Point>::toBuffer(p);
  CHECK(buffer.size() == 8);
  CHECK(static_cast<unsigned char>(buffer[3]) == 5);
  CHECK(static_cast<unsigned char>(buffer[7]) == 0xfd);
  ::geo::Point q = cdr::Serialization<::geo::Point>::fromBuffer(buffer);
  CHECK(q.x == 5 && q.y == -3);

  bool threw = false;
  try {
    cdr::Serialization<::geo::Point>::fromBuffer(std::vector<char>(3));
  } catch (const std::length_error&) {
    threw = true;
  }
  CHECK(threw);

  ::MsgStrict strict{};
  strict.tag = 99;
  std::vector<char> strict_buffer = cdr::Serialization<::MsgStrict>::toBuffer(strict);
  threw = false;
  try {
    cdr::Serialization<::MsgStrict>::fromBuffer(strict_buffer);
  } catch (const std::runtime_error&) {
    threw = true;
  }
  CHECK(threw);

  ::Choice c{};
  c.tag = ::geo::Color::blue;
  c.data.gb = 2.5;
  ::Choice c2 = cdr::Serialization<::Choice>::fromBuffer(cdr::Serialization<::Choice>::toBuffer(c));
  CHECK(c2.tag == ::geo::Color::blue && c2.data.gb == 2.5);

  ::Telemetry t{};
  t.color = ::geo::Color::green;
  t.origin.x = 10;
  t.origin.y = -20;
  t.msg.tag = 1;
  t.msg.data.ping = 42;
  std::strcpy(t.name, "probe");
  t.readings.length = 2;
  t.readings.data[0] = -7;
  t.readings.data[1] = 7;
  t.level = 0.25;
  t.gain = 2.4f;
  t.ok = true;
  t.strict.tag = 1;
  t.strict.data.ping = 3;

  CHECK(validate_Telemetry(&t));
  transform_Telemetry(&t);
  CHECK(t.gain == 2.0f);

  ::Telemetry t2 = cdr::Serialization<::Telemetry>::fromBuffer(
      cdr::Serialization<::Telemetry>::toBuffer(t));
  CHECK(t2.color == ::geo::Color::green);
  CHECK(t2.origin.y == -20 && t2.msg.data.ping == 42);
  CHECK(std::strcmp(t2.name, "probe") == 0);
  CHECK(t2.readings.length == 2 && t2.readings.data[0] == -7);
  CHECK(t2.level == 0.25 && t2.gain == 2.0f && t2.ok);

  t.level = -1.0;
  CHECK(!validate_Telemetry(&t));
  return 0;
}
"#;

#[test]
fn test_generated_c_round_trips() -> Result<()> {
    if !compiler_available("gcc") {
        eprintln!("gcc not found, skipping");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("model.h"), generate(TargetLanguage::C)?)?;
    fs::write(dir.path().join("driver.c"), C_DRIVER)?;
    build_and_run("gcc", "c11", dir.path(), "driver.c")
}

#[test]
fn test_generated_cpp_round_trips() -> Result<()> {
    if !compiler_available("g++") {
        eprintln!("g++ not found, skipping");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("model.hpp"), generate(TargetLanguage::Cpp)?)?;
    fs::write(dir.path().join("driver.cpp"), CPP_DRIVER)?;
    build_and_run("g++", "c++17", dir.path(), "driver.cpp")
}
